//! hackkit core - Hook/Injection Toolkit
//!
//! Lets many independent hacks modify a game program at load time:
//! - [`patch`] - Rewrite program text before subsystems are rebuilt from it
//! - [`hooks`] - Register before/after hooks and compose them into functions
//! - [`bootstrap`] - Apply everything exactly once on the first start-up
//! - [`dialog`] - Dialog tag helpers built on hooks
//! - [`Scheduler`] - Frame-driven tasks, timers and suspended calls
//!
//! # Re-exports
//!
//! This crate re-exports the SDK and engine crates for convenience:
//! - [`sdk`] - Target paths, phases and bootstrap states
//! - [`engine`] - The program model hacks operate on
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hackkit_core::{bootstrap, CoreConfig, Hook, HookRegistry, Program};
//!
//! let config = CoreConfig::load()?;
//! hackkit_core::logging::init(&config);
//!
//! let program = Arc::new(load_game());
//! let registry = Arc::new(HookRegistry::with_config(&config));
//!
//! registry.hack("fast-text").inject("text_speed = 50", ["text_speed = 5"])?;
//! registry.after("onExitDialog", Hook::sync(|_| Ok(serde_json::Value::Null)))?;
//!
//! bootstrap::install(&program, registry, &config)?;
//! program.call("startExportedGame", vec![])?;
//! ```

// Allow the crate to refer to itself as `hackkit_core` for proc macro compatibility
extern crate self as hackkit_core;

// Re-export SDK and engine crates
pub use hackkit_engine as engine;
pub use hackkit_sdk as sdk;

pub mod bootstrap;
pub mod config;
pub mod dialog;
pub mod frame;
pub mod hooks;
pub mod logging;
pub mod patch;
pub mod tasks;
pub mod timers;

// Re-export commonly used items
pub use bootstrap::{install, BootstrapError, BootstrapSummary};
pub use config::{ConfigError, ConfigResult, CoreConfig, HackOptions};
pub use frame::Scheduler;
pub use hooks::{apply_hook, apply_hooks, Hack, Hook, HookError, HookRegistry};
pub use patch::{apply_patch, apply_patches, patch_text, Matcher, PatchEntry, PatchError};
pub use tasks::{QueueError, TaskSender};
pub use timers::{TimerFlags, TimerKey};

// Re-export the program model
pub use hackkit_engine::{Args, Call, Function, Program, ProgramError, Value};

// Re-export macros
pub use hackkit_macros::{dialog_tag, hook};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[hook(before = "player.move", hack = "double-speed")]
    fn double_steps(args: Args) -> Result<Value, ProgramError> {
        let steps = args.first().and_then(Value::as_i64).unwrap_or(1);
        Ok(json!([steps * 2]))
    }

    #[hook(after = "player.move")]
    async fn report_steps(args: Args) -> Result<Value, ProgramError> {
        Ok(json!(format!("moved {}", args.first().and_then(Value::as_i64).unwrap_or(0))))
    }

    #[dialog_tag("shout", dual)]
    fn shout(params: Args) -> Result<Value, ProgramError> {
        Ok(json!(params.len()))
    }

    #[test]
    fn test_generated_hook_registration() {
        let program = Program::new();
        let registry = HookRegistry::new();
        program
            .define_fn("player.move", |args| Ok(json!(args.first().and_then(Value::as_i64).unwrap_or(0))))
            .unwrap();

        double_steps_register(&registry).unwrap();
        report_steps_register(&registry).unwrap();

        let hooks = registry
            .hooks_for(&sdk::TargetPath::parse("player.move").unwrap())
            .unwrap();
        assert_eq!(hooks.before[0].hack.as_deref(), Some("double-speed"));
        assert!(hooks.after[0].hook.is_async());

        apply_hooks(&program, &registry).unwrap();
        let result = program.call("player.move", vec![json!(3)]).unwrap().wait().unwrap();
        assert_eq!(result, json!("moved 6"));
    }

    #[test]
    fn test_generated_dialog_tag_registration() {
        let registry = HookRegistry::new();
        shout_register(&registry).unwrap();
        assert_eq!(registry.dialog_tags(), vec!["shout", "shoutNow"]);
    }
}
