//! Bootstrap sequencer
//!
//! [`install`] wraps the program's start-up entry point. The first call to it
//! puts the original entry point back, then:
//!
//! 1. applies every queued source patch
//! 2. rebuilds the subsystems built from source, in registration order
//! 3. composes and installs every registered hook
//! 4. rebinds host callbacks so they see the hooked functions
//!
//! and finally calls the entry point, as installed by step 3, with the original
//! arguments. Later calls reach it directly.
//!
//! A failed patch aborts start-up before any hook is installed. A failure
//! while installing hooks is not rolled back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hackkit_engine::{Args, Call, Callable, Function, FunctionKind, Program, ProgramError};
use hackkit_sdk::{BootstrapState, TargetPath};

use crate::config::CoreConfig;
use crate::hooks::{apply_hooks, HookError, HookRegistry};
use crate::patch::{apply_patches, PatchError};

/// Bootstrap errors
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The configured entry point is not a defined function
    #[error("Start-up entry point '{0}' is not defined")]
    MissingEntryPoint(String),

    /// Bootstrap was already installed or already ran for this registry
    #[error("Bootstrap already installed on '{0}'")]
    AlreadyInstalled(String),

    #[error("Source patching failed: {0}")]
    Patch(#[from] PatchError),

    #[error("Hook installation failed: {0}")]
    Hook(#[from] HookError),

    #[error(transparent)]
    Program(#[from] ProgramError),
}

/// What one bootstrap pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub patches: usize,
    pub subsystems: usize,
    pub hooks: usize,
    pub callbacks: usize,
}

/// Entry point wrapper running bootstrap on the first call
struct StartupWrapper {
    program: Weak<Program>,
    registry: Arc<HookRegistry>,
    config: CoreConfig,
    entry: TargetPath,
    original: Function,
    started: AtomicBool,
}

impl Callable for StartupWrapper {
    fn call(&self, args: Args) -> Result<Call, ProgramError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return self.original.call(args);
        }

        let program = self
            .program
            .upgrade()
            .ok_or_else(|| ProgramError::failed("program dropped before start-up"))?;

        // Restore first so re-entrant start-up calls skip bootstrap
        program.replace_function(&self.entry, self.original.clone())?;

        run(&program, &self.registry, &self.config).map_err(ProgramError::external)?;

        // Resolve again: the entry point may itself be hooked now
        program.call(&self.entry, args)
    }
}

/// Wrap the configured entry point so the first start-up bootstraps hacks
pub fn install(
    program: &Arc<Program>,
    registry: Arc<HookRegistry>,
    config: &CoreConfig,
) -> Result<(), BootstrapError> {
    let entry = TargetPath::parse(&config.bootstrap.entry_point).map_err(ProgramError::from)?;

    let original = program
        .function(&entry)?
        .ok_or_else(|| BootstrapError::MissingEntryPoint(entry.to_string()))?;

    if original.kind() == FunctionKind::Bootstrap || registry.state().has_begun() {
        return Err(BootstrapError::AlreadyInstalled(entry.to_string()));
    }

    let wrapper = StartupWrapper {
        program: Arc::downgrade(program),
        registry: registry.clone(),
        config: config.clone(),
        entry: entry.clone(),
        original,
        started: AtomicBool::new(false),
    };

    program.replace_function(&entry, Function::from_callable(FunctionKind::Bootstrap, Arc::new(wrapper)))?;

    tracing::info!(
        "Bootstrap installed on {} ({} patches, {} hooks on {} targets)",
        entry,
        registry.patch_count(),
        registry.hook_count(),
        registry.targets().len()
    );
    Ok(())
}

/// Run the bootstrap steps without touching the entry point
///
/// Registration is closed from the moment this starts.
pub fn run(program: &Program, registry: &HookRegistry, config: &CoreConfig) -> Result<BootstrapSummary, BootstrapError> {
    if registry.state().has_begun() {
        return Err(BootstrapError::AlreadyInstalled(
            config.bootstrap.entry_point.clone(),
        ));
    }

    let result = run_steps(program, registry, config);
    match &result {
        Ok(summary) => {
            registry.set_state(BootstrapState::Started);
            tracing::info!(
                "Bootstrap complete: {} patches, {} subsystems, {} hooked targets, {} callbacks",
                summary.patches,
                summary.subsystems,
                summary.hooks,
                summary.callbacks
            );
        }
        Err(e) => {
            registry.set_state(BootstrapState::Failed);
            tracing::error!("Bootstrap aborted: {}", e);
        }
    }
    result
}

fn run_steps(program: &Program, registry: &HookRegistry, config: &CoreConfig) -> Result<BootstrapSummary, BootstrapError> {
    let mut summary = BootstrapSummary::default();

    registry.set_state(BootstrapState::Patching);
    let patches = registry.patches();
    summary.patches = apply_patches(program, &patches, config.patching.strict_single_match)?;
    tracing::info!("Applied {} source patches", summary.patches);

    registry.set_state(BootstrapState::Reinitializing);
    summary.subsystems = program.rebuild_subsystems()?;
    tracing::info!("Rebuilt {} subsystems", summary.subsystems);

    registry.set_state(BootstrapState::HookInstalling);
    if !registry.dialog.lock().is_empty() {
        program
            .ensure_object(registry.dialog_config().functions_root.as_str())
            .map_err(HookError::from)?;
    }
    summary.hooks = apply_hooks(program, registry)?;
    summary.callbacks = program.rebind_callbacks()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hook;
    use hackkit_engine::Value;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    const ENTRY: &str = "startExportedGame";

    fn program_with_entry(starts: &Arc<AtomicUsize>) -> Arc<Program> {
        let program = Arc::new(Program::new());
        let s = starts.clone();
        program
            .define_fn(ENTRY, move |_| {
                s.fetch_add(1, Ordering::SeqCst);
                Ok(json!("started"))
            })
            .unwrap();
        program
    }

    #[test]
    fn test_first_start_bootstraps_once() {
        let starts = Arc::new(AtomicUsize::new(0));
        let rebuilds = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());

        let r = rebuilds.clone();
        program.add_subsystem_fn("renderer", move |_| {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        install(&program, registry.clone(), &CoreConfig::default()).unwrap();
        assert_eq!(
            program.function(ENTRY).unwrap().unwrap().kind(),
            FunctionKind::Bootstrap
        );

        let first = program.call(ENTRY, vec![]).unwrap().wait().unwrap();
        let second = program.call(ENTRY, vec![]).unwrap().wait().unwrap();

        assert_eq!(first, json!("started"));
        assert_eq!(second, json!("started"));
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(rebuilds.load(Ordering::SeqCst), 1);
        assert_eq!(registry.state(), BootstrapState::Started);
        assert_eq!(
            program.function(ENTRY).unwrap().unwrap().kind(),
            FunctionKind::Native
        );
    }

    #[test]
    fn test_first_start_runs_entry_point_hooks() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        registry
            .before(
                ENTRY,
                Hook::sync(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                }),
            )
            .unwrap();
        registry
            .after(ENTRY, Hook::sync(|_| Ok(json!("started with hacks"))))
            .unwrap();

        install(&program, registry, &CoreConfig::default()).unwrap();

        let first = program.call(ENTRY, vec![]).unwrap().wait().unwrap();
        assert_eq!(first, json!("started with hacks"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        let second = program.call(ENTRY, vec![]).unwrap().wait().unwrap();
        assert_eq!(second, first);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(
            program.function(ENTRY).unwrap().unwrap().kind(),
            FunctionKind::Composed
        );
    }

    #[test]
    fn test_captured_wrapper_does_not_rerun() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());

        install(&program, registry.clone(), &CoreConfig::default()).unwrap();
        let wrapper = program.function(ENTRY).unwrap().unwrap();

        wrapper.call(vec![]).unwrap();
        wrapper.call(vec![]).unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(registry.state(), BootstrapState::Started);
    }

    #[test]
    fn test_patched_source_seen_by_rebuilt_subsystems() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());

        program.add_source("engine", "var text_speed = 50;");
        program.add_subsystem_fn("dialog", |program| {
            let text = program.source_text("engine").unwrap_or_default();
            program.set_value("dialog.source", json!(text))
        });
        registry
            .hack("fast-text")
            .inject(crate::patch::Matcher::regex(r"text_speed = \d+").unwrap(), ["text_speed = ", "5"])
            .unwrap();

        install(&program, registry, &CoreConfig::default()).unwrap();
        program.call(ENTRY, vec![]).unwrap();

        assert_eq!(
            program.value("dialog.source").unwrap(),
            Some(json!("var text_speed = 5;"))
        );
    }

    #[test]
    fn test_hooks_installed_before_start() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        program
            .define_fn("f", |args| {
                Ok(json!(args.first().and_then(Value::as_i64).unwrap_or(0) + 1))
            })
            .unwrap();
        registry
            .before(
                "f",
                Hook::sync(|args| Ok(json!([args.first().and_then(Value::as_i64).unwrap_or(0) * 2]))),
            )
            .unwrap();
        let s = seen.clone();
        registry
            .after(
                "f",
                Hook::sync(move |args| {
                    s.lock().push(args.first().cloned().unwrap_or(Value::Null));
                    Ok(Value::Null)
                }),
            )
            .unwrap();

        let result = program.call("f", vec![json!(3)]).unwrap().wait().unwrap();
        assert_eq!(result, json!(4));

        install(&program, registry, &CoreConfig::default()).unwrap();
        program.call(ENTRY, vec![]).unwrap();

        let result = program.call("f", vec![json!(3)]).unwrap().wait().unwrap();
        assert_eq!(result, json!(7));
        assert_eq!(*seen.lock(), vec![json!(7)]);
    }

    #[test]
    fn test_patch_failure_aborts_without_hooks() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());

        program.define_fn("f", |_| Ok(json!("plain"))).unwrap();
        registry.after("f", Hook::sync(|_| Ok(json!("hooked")))).unwrap();
        registry.inject("not in any block", ["x"]).unwrap();

        install(&program, registry.clone(), &CoreConfig::default()).unwrap();
        let err = program.call(ENTRY, vec![]).unwrap_err();

        let cause = err.downcast_ref::<BootstrapError>().unwrap();
        assert!(matches!(cause, BootstrapError::Patch(PatchError::NotFound { .. })));
        assert_eq!(registry.state(), BootstrapState::Failed);
        assert_eq!(starts.load(Ordering::SeqCst), 0);
        assert_eq!(
            program.call("f", vec![]).unwrap().into_ready(),
            Some(json!("plain"))
        );
    }

    #[test]
    fn test_registration_closed_during_bootstrap() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());
        let observed = Arc::new(Mutex::new(None));

        let r = registry.clone();
        let o = observed.clone();
        program.add_subsystem_fn("late-hack", move |_| {
            *o.lock() = Some((r.state(), r.before("f", Hook::sync(|_| Ok(Value::Null))).is_err()));
            Ok(())
        });

        install(&program, registry.clone(), &CoreConfig::default()).unwrap();
        program.call(ENTRY, vec![]).unwrap();

        assert_eq!(
            *observed.lock(),
            Some((BootstrapState::Reinitializing, true))
        );
        assert!(matches!(
            registry.after("f", Hook::sync(|_| Ok(Value::Null))),
            Err(HookError::RegistrationClosed(BootstrapState::Started))
        ));
    }

    #[test]
    fn test_callbacks_rebound_to_hooked_functions() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());

        program.define_fn("update", |_| Ok(json!("frame"))).unwrap();
        program.bind_callback("update", "update").unwrap();
        registry.after("update", Hook::sync(|_| Ok(json!("hooked frame")))).unwrap();

        install(&program, registry, &CoreConfig::default()).unwrap();
        program.call(ENTRY, vec![]).unwrap();

        let result = program.fire_callback("update", vec![]).unwrap();
        assert_eq!(result.into_ready(), Some(json!("hooked frame")));
    }

    #[test]
    fn test_dialog_root_created() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());

        registry
            .add_dialog_tag("greet", Hook::sync(|args| Ok(json!(args))))
            .unwrap();

        install(&program, registry, &CoreConfig::default()).unwrap();
        program.call(ENTRY, vec![]).unwrap();

        let result = program
            .call("kitsy.dialogFunctions.greet", vec![json!("hi, there")])
            .unwrap();
        assert_eq!(result.into_ready(), Some(json!(["hi", "there"])));
    }

    #[test]
    fn test_missing_entry_point() {
        let program = Arc::new(Program::new());
        let err = install(&program, Arc::new(HookRegistry::new()), &CoreConfig::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingEntryPoint(ref name) if name == ENTRY));
    }

    #[test]
    fn test_install_twice_rejected() {
        let starts = Arc::new(AtomicUsize::new(0));
        let program = program_with_entry(&starts);
        let registry = Arc::new(HookRegistry::new());

        install(&program, registry.clone(), &CoreConfig::default()).unwrap();
        let err = install(&program, registry, &CoreConfig::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::AlreadyInstalled(_)));
    }

    #[test]
    fn test_custom_entry_point() {
        let program = Arc::new(Program::new());
        let registry = Arc::new(HookRegistry::new());
        program.define_fn("game.boot", |_| Ok(json!("booted"))).unwrap();

        let mut config = CoreConfig::default();
        config.bootstrap.entry_point = "game.boot".to_string();

        install(&program, registry.clone(), &config).unwrap();
        let result = program.call("game.boot", vec![]).unwrap();
        assert_eq!(result.into_ready(), Some(json!("booted")));
        assert_eq!(registry.state(), BootstrapState::Started);
    }
}
