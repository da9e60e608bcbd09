//! Dialog tag helpers
//!
//! A dialog tag is a named function the game's dialog interpreter calls when
//! it reaches `{tag params}` in a line of dialog. Tags registered here are
//! installed under the dialog functions root (`kitsy.dialogFunctions` by
//! default) when bootstrap composes hooks.
//!
//! Hacks write tags as `(tag params)` in game data, which the stock
//! interpreter ignores. A hook on the world parser rewrites them to
//! `{tag params}` first; `\(tag params)` is unescaped to the literal text
//! `(tag params)` instead.
//!
//! Deferred tags record their parameters and run once the dialog box closes.
//! Pending invocations are dropped when the game data is cleared.

mod convert;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use hackkit_engine::{Args, ProgramError, Value};
use hackkit_sdk::{InvalidTargetPath, Phase, TagTiming, TargetPath};

use crate::hooks::{Hack, Hook, HookError, HookRegistry};

pub use convert::{convert_dialog_tags, parse_params, tag_pattern};

/// Deferred invocations waiting for the dialog box to close
type DeferredQueue = Mutex<Vec<(Hook, Args)>>;

/// Dialog tag bookkeeping kept by the registry
#[derive(Default)]
pub(crate) struct DialogTags {
    names: HashSet<String>,
    deferred: Option<Arc<DeferredQueue>>,
}

impl DialogTags {
    pub(crate) fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn pending(&self) -> usize {
        self.deferred.as_ref().map(|queue| queue.lock().len()).unwrap_or(0)
    }
}

/// Handler arguments: the host passes the raw parameter text, or a list
fn handler_args(args: Args) -> Args {
    match args.into_iter().next() {
        Some(Value::String(text)) => parse_params(&text).into_iter().map(Value::String).collect(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Value::String(text),
                other => Value::String(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl HookRegistry {
    /// Register a tag whose handler runs as soon as the interpreter reaches it
    pub fn add_dialog_tag(&self, tag: &str, handler: Hook) -> Result<(), HookError> {
        self.register_dialog_tag(tag, TagTiming::Immediate, handler, None)
    }

    /// Register a tag whose handler runs after the dialog box closes
    pub fn add_deferred_dialog_tag(&self, tag: &str, handler: Hook) -> Result<(), HookError> {
        self.register_dialog_tag(tag, TagTiming::Deferred, handler, None)
    }

    /// Register `tag` as deferred and `<tag>Now` as immediate
    pub fn add_dual_dialog_tag(&self, tag: &str, handler: Hook) -> Result<(), HookError> {
        self.register_dual_dialog_tag(tag, handler, None)
    }

    /// Registered dialog tag names, sorted
    pub fn dialog_tags(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dialog.lock().names.iter().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of deferred invocations waiting for the dialog to close
    pub fn pending_dialog_tags(&self) -> usize {
        self.dialog.lock().pending()
    }

    pub(crate) fn register_dual_dialog_tag(
        &self,
        tag: &str,
        handler: Hook,
        hack: Option<&str>,
    ) -> Result<(), HookError> {
        self.register_dialog_tag(tag, TagTiming::Deferred, handler.clone(), hack)?;
        self.register_dialog_tag(&format!("{}Now", tag), TagTiming::Immediate, handler, hack)
    }

    pub(crate) fn register_dialog_tag(
        &self,
        tag: &str,
        timing: TagTiming,
        handler: Hook,
        hack: Option<&str>,
    ) -> Result<(), HookError> {
        if tag.contains('.') {
            return Err(HookError::InvalidTarget(InvalidTargetPath {
                path: tag.to_string(),
                reason: "dialog tag names cannot contain '.'",
            }));
        }

        // Resolve everything up front so a bad target never leaves the name taken
        let config = self.dialog_config();
        let target = TargetPath::parse(&config.functions_root)?.child(tag)?;
        let world_parser = TargetPath::parse(&config.world_parser)?;
        let flush_targets = match timing {
            TagTiming::Immediate => None,
            TagTiming::Deferred => Some((
                TargetPath::parse(&config.exit_dialog)?,
                TargetPath::parse(&config.clear_game_data)?,
            )),
        };
        let pattern = tag_pattern(tag)?;

        if self.state().has_begun() {
            return Err(HookError::RegistrationClosed(self.state()));
        }

        let deferred = {
            let mut tags = self.dialog.lock();
            if tags.names.contains(tag) {
                return Err(HookError::DuplicateDialogTag(tag.to_string()));
            }
            tags.names.insert(tag.to_string());

            flush_targets.map(|targets| {
                let fresh = tags.deferred.is_none();
                let queue = tags.deferred.get_or_insert_with(Default::default).clone();
                (queue, fresh.then_some(targets))
            })
        };

        self.register(
            &world_parser,
            Phase::Before,
            Hook::sync(move |mut args| {
                let Some(Value::String(data)) = args.first() else {
                    return Ok(Value::Null);
                };
                let converted = convert_dialog_tags(&pattern, data);
                if converted == *data {
                    return Ok(Value::Null);
                }
                args[0] = Value::String(converted);
                Ok(Value::Array(args))
            }),
            hack,
        )?;

        match deferred {
            None => {
                self.register(&target, Phase::Before, handler.map_args(handler_args), hack)?;
            }
            Some((queue, flush_targets)) => {
                let recorder = queue.clone();
                self.register(
                    &target,
                    Phase::Before,
                    Hook::sync(move |args| {
                        recorder.lock().push((handler.clone(), handler_args(args)));
                        Ok(Value::Null)
                    }),
                    hack,
                )?;

                if let Some((exit_dialog, clear_game_data)) = flush_targets {
                    self.register_deferred_flush(queue, &exit_dialog, &clear_game_data, hack)?;
                }
            }
        }

        tracing::debug!("Registered {:?} dialog tag '{}' at {}", timing, tag, target);
        Ok(())
    }

    /// Run deferred tags after the exit-dialog target, drop them on reset
    fn register_deferred_flush(
        &self,
        queue: Arc<DeferredQueue>,
        exit_dialog: &TargetPath,
        clear_game_data: &TargetPath,
        hack: Option<&str>,
    ) -> Result<(), HookError> {
        let flush_queue = queue.clone();
        self.register(
            exit_dialog,
            Phase::After,
            Hook::async_fn(move |_| {
                let pending = std::mem::take(&mut *flush_queue.lock());
                async move {
                    for (handler, params) in pending {
                        handler.invoke(params)?.into_future().await?;
                    }
                    Ok::<Value, ProgramError>(Value::Null)
                }
            }),
            hack,
        )?;

        self.register(
            clear_game_data,
            Phase::After,
            Hook::sync(move |_| {
                let dropped = std::mem::take(&mut *queue.lock()).len();
                if dropped > 0 {
                    tracing::debug!("Dropped {} pending dialog tags", dropped);
                }
                Ok(Value::Null)
            }),
            hack,
        )
    }
}

impl Hack<'_> {
    /// Register an immediate dialog tag owned by this hack
    pub fn add_dialog_tag(&self, tag: &str, handler: Hook) -> Result<(), HookError> {
        self.registry
            .register_dialog_tag(tag, TagTiming::Immediate, handler, Some(&self.name))
    }

    /// Register a deferred dialog tag owned by this hack
    pub fn add_deferred_dialog_tag(&self, tag: &str, handler: Hook) -> Result<(), HookError> {
        self.registry
            .register_dialog_tag(tag, TagTiming::Deferred, handler, Some(&self.name))
    }

    /// Register `tag` as deferred and `<tag>Now` as immediate
    pub fn add_dual_dialog_tag(&self, tag: &str, handler: Hook) -> Result<(), HookError> {
        self.registry
            .register_dual_dialog_tag(tag, handler, Some(&self.name))
    }
}
