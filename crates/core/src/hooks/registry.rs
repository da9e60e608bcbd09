//! Hook registry
//!
//! Accumulates before/after hooks per target and the queue of source patches.
//! Registration is purely declarative: no program function is touched until
//! bootstrap composes the hooks.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{Mutex, RwLock};

use hackkit_sdk::{BootstrapState, IntoTargetPath, Phase, TargetPath};

use super::hook::Hook;
use super::HookError;
use crate::config::{CoreConfig, DialogConfig};
use crate::dialog::DialogTags;
use crate::patch::{Matcher, PatchEntry};

/// A registered hook and the hack it came from
#[derive(Debug, Clone)]
pub struct HookEntry {
    pub hook: Hook,
    pub hack: Option<String>,
}

/// Hooks registered against one target
#[derive(Debug, Clone, Default)]
pub struct TargetHooks {
    pub before: Vec<HookEntry>,
    pub after: Vec<HookEntry>,
}

impl TargetHooks {
    /// Total number of hooks in both phases
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

#[derive(Default)]
struct RegistryInner {
    /// Targets in first-registration order
    order: Vec<TargetPath>,
    hooks: HashMap<TargetPath, TargetHooks>,
    patches: Vec<PatchEntry>,
    /// Targets already replaced by a composed function
    composed: HashSet<TargetPath>,
}

/// Registration table for one program instance
///
/// Create one per program, hand it to every hack, then pass it to
/// [`crate::bootstrap::install`].
pub struct HookRegistry {
    inner: RwLock<RegistryInner>,
    state: AtomicU8,
    dialog_config: DialogConfig,
    pub(crate) dialog: Mutex<DialogTags>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HookRegistry {
    /// Create a registry using the default dialog targets
    pub fn new() -> Self {
        Self::with_dialog_config(DialogConfig::default())
    }

    /// Create a registry using the targets from `config`
    pub fn with_config(config: &CoreConfig) -> Self {
        Self::with_dialog_config(config.dialog.clone())
    }

    fn with_dialog_config(dialog_config: DialogConfig) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            state: AtomicU8::new(BootstrapState::Uninitialized as u8),
            dialog_config,
            dialog: Mutex::new(DialogTags::default()),
        }
    }

    /// Registrar that tags everything it registers with `name`
    pub fn hack(&self, name: &str) -> Hack<'_> {
        Hack {
            registry: self,
            name: name.to_string(),
        }
    }

    /// Run `hook` before the function at `target`
    pub fn before(&self, target: impl IntoTargetPath, hook: Hook) -> Result<(), HookError> {
        self.register(target, Phase::Before, hook, None)
    }

    /// Run `hook` after the function at `target`
    pub fn after(&self, target: impl IntoTargetPath, hook: Hook) -> Result<(), HookError> {
        self.register(target, Phase::After, hook, None)
    }

    /// Queue a source patch
    pub fn inject<I, S>(&self, matcher: impl Into<Matcher>, fragments: I) -> Result<(), HookError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.queue_patch(PatchEntry::new(matcher.into(), fragments, None))
    }

    /// Add a hook for a phase of `target`
    pub fn register(
        &self,
        target: impl IntoTargetPath,
        phase: Phase,
        hook: Hook,
        hack: Option<&str>,
    ) -> Result<(), HookError> {
        let target = target.into_target_path()?;
        self.ensure_open()?;

        tracing::debug!(
            "Registered {} hook on {}{}",
            phase,
            target,
            hack.map(|h| format!(" ({})", h)).unwrap_or_default()
        );

        let mut inner = self.inner.write();
        if !inner.hooks.contains_key(&target) {
            inner.order.push(target.clone());
        }

        let entry = HookEntry {
            hook,
            hack: hack.map(str::to_string),
        };
        let hooks = inner.hooks.entry(target).or_default();
        match phase {
            Phase::Before => hooks.before.push(entry),
            Phase::After => hooks.after.push(entry),
        }
        Ok(())
    }

    /// Add a patch to the end of the queue
    pub fn queue_patch(&self, patch: PatchEntry) -> Result<(), HookError> {
        self.ensure_open()?;
        tracing::debug!(
            "Queued patch {}{}",
            patch.matcher,
            patch
                .hack
                .as_deref()
                .map(|h| format!(" ({})", h))
                .unwrap_or_default()
        );
        self.inner.write().patches.push(patch);
        Ok(())
    }

    /// Every target with at least one hook, in first-registration order
    pub fn targets(&self) -> Vec<TargetPath> {
        self.inner.read().order.clone()
    }

    /// Snapshot of the hooks registered on `target`
    pub fn hooks_for(&self, target: &TargetPath) -> Option<TargetHooks> {
        self.inner.read().hooks.get(target).cloned()
    }

    /// Total number of registered hooks
    pub fn hook_count(&self) -> usize {
        self.inner.read().hooks.values().map(TargetHooks::len).sum()
    }

    /// Number of queued patches
    pub fn patch_count(&self) -> usize {
        self.inner.read().patches.len()
    }

    /// Snapshot of the patch queue
    pub fn patches(&self) -> Vec<PatchEntry> {
        self.inner.read().patches.clone()
    }

    /// Current bootstrap state
    pub fn state(&self) -> BootstrapState {
        BootstrapState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub(crate) fn set_state(&self, state: BootstrapState) {
        tracing::trace!("Bootstrap state -> {:?}", state);
        self.state.store(state as u8, Ordering::Release);
    }

    /// Targets for dialog tag helpers
    pub fn dialog_config(&self) -> &DialogConfig {
        &self.dialog_config
    }

    /// Whether `target` has been replaced by a composed function
    pub fn is_composed(&self, target: &TargetPath) -> bool {
        self.inner.read().composed.contains(target)
    }

    /// Record that `target` is composed; `false` if it already was
    pub(crate) fn mark_composed(&self, target: &TargetPath) -> bool {
        self.inner.write().composed.insert(target.clone())
    }

    fn ensure_open(&self) -> Result<(), HookError> {
        let state = self.state();
        if state.has_begun() {
            return Err(HookError::RegistrationClosed(state));
        }
        Ok(())
    }
}

/// Registration handle carrying a hack name
///
/// Patches queued through it never target source blocks the same hack
/// contributed.
pub struct Hack<'a> {
    pub(crate) registry: &'a HookRegistry,
    pub(crate) name: String,
}

impl Hack<'_> {
    /// Name of the hack
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `hook` before the function at `target`
    pub fn before(&self, target: impl IntoTargetPath, hook: Hook) -> Result<(), HookError> {
        self.registry
            .register(target, Phase::Before, hook, Some(&self.name))
    }

    /// Run `hook` after the function at `target`
    pub fn after(&self, target: impl IntoTargetPath, hook: Hook) -> Result<(), HookError> {
        self.registry
            .register(target, Phase::After, hook, Some(&self.name))
    }

    /// Queue a source patch owned by this hack
    pub fn inject<I, S>(&self, matcher: impl Into<Matcher>, fragments: I) -> Result<(), HookError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry
            .queue_patch(PatchEntry::new(matcher.into(), fragments, Some(&self.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hackkit_engine::Value;

    fn noop() -> Hook {
        Hook::sync(|_| Ok(Value::Null))
    }

    #[test]
    fn test_targets_deduplicated_in_order() {
        let registry = HookRegistry::new();
        registry.after("b", noop()).unwrap();
        registry.before("a", noop()).unwrap();
        registry.before("b", noop()).unwrap();
        registry.after("a.c", noop()).unwrap();

        let targets: Vec<String> = registry.targets().iter().map(|t| t.to_string()).collect();
        assert_eq!(targets, vec!["b", "a", "a.c"]);
        assert_eq!(registry.hook_count(), 4);

        let b = registry.hooks_for(&TargetPath::parse("b").unwrap()).unwrap();
        assert_eq!(b.before.len(), 1);
        assert_eq!(b.after.len(), 1);
    }

    #[test]
    fn test_invalid_target_rejected() {
        let registry = HookRegistry::new();
        let err = registry.before("a..b", noop()).unwrap_err();
        assert!(matches!(err, HookError::InvalidTarget(_)));
        assert!(registry.targets().is_empty());
    }

    #[test]
    fn test_patches_keep_order_and_hack() {
        let registry = HookRegistry::new();
        registry.inject("one", ["1"]).unwrap();
        registry.hack("speedy").inject(Matcher::regex("two").unwrap(), ["2", "2"]).unwrap();

        let patches = registry.patches();
        assert_eq!(registry.patch_count(), 2);
        assert_eq!(patches[0].replacement, "1");
        assert!(patches[0].hack.is_none());
        assert_eq!(patches[1].replacement, "22");
        assert_eq!(patches[1].hack.as_deref(), Some("speedy"));
    }

    #[test]
    fn test_hack_registrar_names_hooks() {
        let registry = HookRegistry::new();
        let hack = registry.hack("transparent-sprites");
        hack.before("renderer.drawTile", noop()).unwrap();

        let hooks = registry
            .hooks_for(&TargetPath::parse("renderer.drawTile").unwrap())
            .unwrap();
        assert_eq!(hooks.before[0].hack.as_deref(), Some("transparent-sprites"));
        assert_eq!(hack.name(), "transparent-sprites");
    }

    #[test]
    fn test_registration_closed_after_bootstrap_begins() {
        let registry = HookRegistry::new();
        registry.set_state(BootstrapState::Patching);

        assert!(matches!(
            registry.before("a", noop()),
            Err(HookError::RegistrationClosed(BootstrapState::Patching))
        ));
        assert!(matches!(
            registry.inject("x", ["y"]),
            Err(HookError::RegistrationClosed(_))
        ));
    }

    #[test]
    fn test_mark_composed_once() {
        let registry = HookRegistry::new();
        let target = TargetPath::parse("f").unwrap();
        assert!(!registry.is_composed(&target));
        assert!(registry.mark_composed(&target));
        assert!(!registry.mark_composed(&target));
        assert!(registry.is_composed(&target));
    }
}
