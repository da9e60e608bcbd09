//! Hook system
//!
//! - [`HookRegistry`] collects before/after hooks and source patches
//! - [`Hook`] is a sync or async hook body
//! - [`composer`] turns the registered hooks into installed functions
//!
//! # Example
//!
//! ```ignore
//! use hackkit_core::hooks::{Hook, HookRegistry};
//! use serde_json::json;
//!
//! let registry = HookRegistry::new();
//! let hack = registry.hack("double-speed");
//!
//! hack.before("player.move", Hook::sync(|args| {
//!     let steps = args.first().and_then(|v| v.as_i64()).unwrap_or(1);
//!     Ok(json!([steps * 2]))
//! }))?;
//! ```

pub mod composer;
mod hook;
mod registry;

use hackkit_engine::ProgramError;
use hackkit_sdk::{BootstrapState, InvalidTargetPath};

use crate::patch::PatchError;

pub use composer::{apply_hook, apply_hooks, compose, Stage};
pub use hook::{AsyncHookFn, Hook, SyncHookFn};
pub use registry::{Hack, HookEntry, HookRegistry, TargetHooks};

/// Error type for hook registration and installation
#[derive(Debug, Clone, thiserror::Error)]
pub enum HookError {
    /// Bootstrap already started; late registrations would never be installed
    #[error("Registration is closed (bootstrap state: {0:?})")]
    RegistrationClosed(BootstrapState),

    /// A dialog tag with this name already exists
    #[error("Dialog tag '{0}' is already registered")]
    DuplicateDialogTag(String),

    #[error(transparent)]
    InvalidTarget(#[from] InvalidTargetPath),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Program(#[from] ProgramError),
}
