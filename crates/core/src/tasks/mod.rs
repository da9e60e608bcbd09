//! Task queue for frame-loop execution
//!
//! Allows background threads to queue work to execute on the game's frame
//! loop. Tasks are processed each frame by the [`crate::Scheduler`].

pub mod queue;

pub use queue::*;
