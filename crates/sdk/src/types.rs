//! Lifecycle vocabulary shared across crates

use std::fmt;

/// When a hook runs relative to the function it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs before the original function
    Before,
    /// Runs after the original function
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => f.write_str("before"),
            Phase::After => f.write_str("after"),
        }
    }
}

/// Bootstrap progress of a program
///
/// Moves strictly forward: `Uninitialized -> Patching -> Reinitializing ->
/// HookInstalling -> Started`. `Failed` is reached when any bootstrap step
/// aborts start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BootstrapState {
    Uninitialized = 0,
    Patching = 1,
    Reinitializing = 2,
    HookInstalling = 3,
    Started = 4,
    Failed = 5,
}

impl BootstrapState {
    /// Decode from the raw representation, `None` for unknown values
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::Patching),
            2 => Some(Self::Reinitializing),
            3 => Some(Self::HookInstalling),
            4 => Some(Self::Started),
            5 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether bootstrap has begun (registration is closed from here on)
    pub fn has_begun(self) -> bool {
        self != Self::Uninitialized
    }

    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Started | Self::Failed)
    }
}

impl Default for BootstrapState {
    fn default() -> Self {
        Self::Uninitialized
    }
}

/// When a dialog tag handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagTiming {
    /// Runs as soon as the dialog interpreter reaches the tag
    Immediate,
    /// Runs once the dialog box closes
    Deferred,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_state_roundtrip() {
        for state in [
            BootstrapState::Uninitialized,
            BootstrapState::Patching,
            BootstrapState::Reinitializing,
            BootstrapState::HookInstalling,
            BootstrapState::Started,
            BootstrapState::Failed,
        ] {
            assert_eq!(BootstrapState::from_u8(state as u8), Some(state));
        }
        assert_eq!(BootstrapState::from_u8(42), None);
    }

    #[test]
    fn test_bootstrap_state_flags() {
        assert!(!BootstrapState::Uninitialized.has_begun());
        assert!(BootstrapState::Patching.has_begun());
        assert!(BootstrapState::Started.is_terminal());
        assert!(BootstrapState::Failed.is_terminal());
        assert!(!BootstrapState::HookInstalling.is_terminal());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Before.to_string(), "before");
        assert_eq!(Phase::After.to_string(), "after");
    }
}
