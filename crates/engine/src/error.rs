//! Error types for the program model

use std::sync::Arc;

use hackkit_sdk::InvalidTargetPath;

/// Error type for program operations and function calls
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProgramError {
    /// A path segment does not exist
    #[error("Member '{segment}' not found while resolving '{path}'")]
    MemberNotFound { path: String, segment: String },

    /// A path segment exists but is not an object
    #[error("Member '{segment}' is not an object while resolving '{path}'")]
    NotAnObject { path: String, segment: String },

    /// The member at a path is not callable
    #[error("Not a function: {0}")]
    NotAFunction(String),

    /// Target path failed validation
    #[error(transparent)]
    InvalidPath(#[from] InvalidTargetPath),

    /// A subsystem could not be rebuilt from source
    #[error("Subsystem '{name}' failed to rebuild: {reason}")]
    Subsystem { name: String, reason: String },

    /// No callback is bound under this name
    #[error("Unknown callback: {0}")]
    UnknownCallback(String),

    /// Raised by a function body
    #[error("{0}")]
    Failed(String),

    /// Error from a layer above the program (toolkit, host)
    #[error(transparent)]
    External(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProgramError {
    /// Raise an error from a function or hook body
    pub fn failed(message: impl Into<String>) -> Self {
        ProgramError::Failed(message.into())
    }

    /// Wrap an error from another layer
    pub fn external<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ProgramError::External(Arc::new(error))
    }

    /// Access a wrapped external error by type
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            ProgramError::External(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
