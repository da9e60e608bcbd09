//! Hook composer
//!
//! Replaces each hooked target with a single function running
//! `[before..., original?, after...]` strictly in order.
//!
//! # Value threading
//!
//! Every stage receives the current argument list. A non-empty result
//! replaces that list for the next stage (arrays are spread) and becomes the
//! pending return value. An empty result (`null` or `[]`) leaves both as they
//! were. The composed function returns the pending return value.
//!
//! # Suspension
//!
//! A stage returning [`Call::Pending`] suspends the pipeline: the composed call
//! itself returns a pending future and the remaining stages run once the
//! stage's future resolves.

use std::sync::Arc;

use hackkit_engine::value::{is_empty, spread};
use hackkit_engine::{Args, Call, Callable, Function, FunctionKind, Program, ProgramError, Value};
use hackkit_sdk::TargetPath;

use super::hook::Hook;
use super::registry::{HookRegistry, TargetHooks};
use super::HookError;

/// One step of a composed pipeline
#[derive(Debug, Clone)]
pub enum Stage {
    Hook(Hook),
    Original(Function),
}

impl Stage {
    fn invoke(&self, args: Args) -> Result<Call, ProgramError> {
        match self {
            Stage::Hook(hook) => hook.invoke(args),
            Stage::Original(function) => function.call(args),
        }
    }
}

/// Function body running a fixed list of stages
struct Pipeline {
    target: TargetPath,
    stages: Arc<[Stage]>,
}

impl Callable for Pipeline {
    fn call(&self, args: Args) -> Result<Call, ProgramError> {
        tracing::trace!("Calling composed {} ({} stages)", self.target, self.stages.len());
        run_stages(self.stages.clone(), 0, args, Value::Null)
    }
}

/// Fold a stage result into the running arguments and return value
fn thread_value(args: &mut Args, ret: &mut Value, value: Value) {
    if is_empty(&value) {
        return;
    }
    *args = spread(value.clone());
    *ret = value;
}

fn run_stages(stages: Arc<[Stage]>, start: usize, mut args: Args, mut ret: Value) -> Result<Call, ProgramError> {
    for index in start..stages.len() {
        match stages[index].invoke(args.clone())? {
            Call::Ready(value) => thread_value(&mut args, &mut ret, value),
            Call::Pending(future) => {
                let stages = stages.clone();
                return Ok(Call::Pending(Box::pin(async move {
                    let mut args = args;
                    let mut ret = ret;
                    let value = future.await?;
                    thread_value(&mut args, &mut ret, value);
                    run_stages(stages, index + 1, args, ret)?.into_future().await
                })));
            }
        }
    }
    Ok(Call::Ready(ret))
}

/// Build the composed function for a target
pub fn compose(target: &TargetPath, hooks: &TargetHooks, original: Option<Function>) -> Function {
    let stages: Vec<Stage> = hooks
        .before
        .iter()
        .map(|entry| Stage::Hook(entry.hook.clone()))
        .chain(original.map(Stage::Original))
        .chain(hooks.after.iter().map(|entry| Stage::Hook(entry.hook.clone())))
        .collect();

    Function::from_callable(
        FunctionKind::Composed,
        Arc::new(Pipeline {
            target: target.clone(),
            stages: stages.into(),
        }),
    )
}

/// Compose and install the hooks registered on one target
///
/// Returns `false` when the target was already composed or has no hooks.
pub fn apply_hook(program: &Program, registry: &HookRegistry, target: &TargetPath) -> Result<bool, HookError> {
    if registry.is_composed(target) {
        tracing::trace!("{} already composed", target);
        return Ok(false);
    }

    let Some(hooks) = registry.hooks_for(target) else {
        return Ok(false);
    };

    let original = program.function(target)?;
    let has_original = original.is_some();
    let composed = compose(target, &hooks, original);

    program.replace_function(target, composed)?;
    registry.mark_composed(target);

    tracing::debug!(
        "Installed {} before / {} after hooks on {}{}",
        hooks.before.len(),
        hooks.after.len(),
        target,
        if has_original { "" } else { " (no original)" }
    );
    Ok(true)
}

/// Compose every registered target in registration order
///
/// Stops at the first failure; targets installed before it stay installed.
/// Returns the number of targets newly composed.
pub fn apply_hooks(program: &Program, registry: &HookRegistry) -> Result<usize, HookError> {
    let mut installed = 0;
    for target in registry.targets() {
        if apply_hook(program, registry, &target)? {
            installed += 1;
        }
    }
    Ok(installed)
}
