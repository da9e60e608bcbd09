//! Subsystems built from program source
//!
//! Some parts of the program (script interpreter, dialog renderer, ...) are
//! constructed from source text. Once that text is patched the instances
//! built earlier still carry the old behavior, so they must be rebuilt.

use crate::error::ProgramError;
use crate::program::Program;

/// A part of the program that is constructed from source blocks
pub trait Subsystem: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Reconstruct the subsystem from the program's current source
    fn rebuild(&self, program: &Program) -> Result<(), ProgramError>;
}

/// Subsystem backed by a closure
pub(crate) struct FnSubsystem<F> {
    pub name: String,
    pub rebuild: F,
}

impl<F> Subsystem for FnSubsystem<F>
where
    F: Fn(&Program) -> Result<(), ProgramError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn rebuild(&self, program: &Program) -> Result<(), ProgramError> {
        (self.rebuild)(program)
    }
}
