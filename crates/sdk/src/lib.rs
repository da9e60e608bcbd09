//! hackkit SDK - Shared Type Definitions
//!
//! This crate contains the small vocabulary shared by the program model, the
//! toolkit and the macros. It has no dependencies and compiles quickly,
//! allowing parallel compilation of dependent crates.
//!
//! # Modules
//!
//! - [`path`] - Dotted target paths naming patchable functions
//! - [`types`] - Hook phases, bootstrap states and dialog tag timing
//! - [`targets`] - Well-known target names of the stock game program

pub mod path;
pub mod targets;
pub mod types;

pub use path::{IntoTargetPath, InvalidTargetPath, TargetPath};
pub use targets::WELL_KNOWN_TARGETS;
pub use types::{BootstrapState, Phase, TagTiming};
