//! hackkit engine - Target Program Model
//!
//! This crate models the program that hacks modify:
//! - Dynamic values and argument lists
//! - Callable functions whose calls may suspend on asynchronous steps
//! - The nested member scope target paths resolve against
//! - Source blocks and the subsystems built from them
//! - Host callbacks and named data tables
//!
//! # Architecture
//!
//! A [`Program`] is an explicit context object. Hosts build one per running
//! game, populate its scope and sources, and hand it to the toolkit. Several
//! programs can live in one process without sharing any state.
//!
//! # Thread Safety
//!
//! All types are `Send + Sync`. Locks are released before any program
//! function runs, so function bodies may call back into the program.

pub mod error;
pub mod function;
pub mod program;
pub mod scope;
pub mod source;
pub mod subsystem;
pub mod value;

pub use error::ProgramError;
pub use function::{Call, CallFuture, Callable, Function, FunctionKind};
pub use program::Program;
pub use scope::{Member, Scope};
pub use source::{BlockId, SourceBlock, SourceSet};
pub use subsystem::Subsystem;
pub use value::{Args, Value};

pub use hackkit_sdk as sdk;
