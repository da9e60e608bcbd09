//! The program context
//!
//! A [`Program`] is one running instance of the game: its member scope, its
//! source blocks, the subsystems built from them, the host callbacks bound to
//! program functions, and the named data tables hacks read and write.
//! Every instance is independent; nothing here is process-global.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use hackkit_sdk::{IntoTargetPath, TargetPath};

use crate::error::ProgramError;
use crate::function::{Call, Function};
use crate::scope::{Member, Scope};
use crate::source::{BlockId, SourceSet};
use crate::subsystem::{FnSubsystem, Subsystem};
use crate::value::{Args, Value};

/// A host callback captured from a program function
struct CallbackBinding {
    path: TargetPath,
    function: Option<Function>,
}

/// One instance of the target program
#[derive(Default)]
pub struct Program {
    /// Root member scope
    scope: RwLock<Scope>,

    /// Program text
    sources: RwLock<SourceSet>,

    /// Parts built from program text, in registration order
    subsystems: RwLock<Vec<Arc<dyn Subsystem>>>,

    /// Host callbacks (update, quit, load, ...) by name
    callbacks: RwLock<HashMap<String, CallbackBinding>>,

    /// Named data tables (sprites, tiles, items, rooms, variables, ...)
    tables: DashMap<String, Value>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Scope
    // ========================================================================

    /// Read access to the root scope
    pub fn scope(&self) -> RwLockReadGuard<'_, Scope> {
        self.scope.read()
    }

    /// Write access to the root scope
    pub fn scope_mut(&self) -> RwLockWriteGuard<'_, Scope> {
        self.scope.write()
    }

    /// Resolve a function, `Ok(None)` for an undefined slot
    pub fn function(&self, path: impl IntoTargetPath) -> Result<Option<Function>, ProgramError> {
        let path = path.into_target_path()?;
        self.scope.read().function(&path)
    }

    /// Define a function, creating missing parent objects
    pub fn define(&self, path: impl IntoTargetPath, function: Function) -> Result<(), ProgramError> {
        let path = path.into_target_path()?;
        let mut scope = self.scope.write();
        if let Some(parent) = path.parent() {
            scope.ensure_object(&parent)?;
        }
        scope.set_function(&path, function)?;
        tracing::trace!("Defined function {}", path);
        Ok(())
    }

    /// Define a synchronous function from a closure
    pub fn define_fn<F>(&self, path: impl IntoTargetPath, body: F) -> Result<(), ProgramError>
    where
        F: Fn(Args) -> Result<Value, ProgramError> + Send + Sync + 'static,
    {
        self.define(path, Function::new(body))
    }

    /// Replace the function at `path`, returning what was there
    ///
    /// Unlike [`Program::define`] the owning object must already exist.
    pub fn replace_function(
        &self,
        path: impl IntoTargetPath,
        function: Function,
    ) -> Result<Option<Function>, ProgramError> {
        let path = path.into_target_path()?;
        let previous = self.scope.write().set_function(&path, function)?;
        Ok(match previous {
            Some(Member::Function(f)) => Some(f),
            _ => None,
        })
    }

    /// Make sure an object exists at `path`
    pub fn ensure_object(&self, path: impl IntoTargetPath) -> Result<(), ProgramError> {
        let path = path.into_target_path()?;
        self.scope.write().ensure_object(&path)?;
        Ok(())
    }

    /// Call the function at `path`
    ///
    /// The scope lock is released before the function runs, so function bodies
    /// may freely call back into the program.
    pub fn call(&self, path: impl IntoTargetPath, args: Args) -> Result<Call, ProgramError> {
        let path = path.into_target_path()?;
        let function = self
            .scope
            .read()
            .function(&path)?
            .ok_or_else(|| ProgramError::NotAFunction(path.to_string()))?;
        function.call(args)
    }

    /// Read a plain value
    pub fn value(&self, path: impl IntoTargetPath) -> Result<Option<Value>, ProgramError> {
        let path = path.into_target_path()?;
        let scope = self.scope.read();
        Ok(match scope.resolve(&path)? {
            Some(Member::Value(value)) => Some(value.clone()),
            _ => None,
        })
    }

    /// Store a plain value, creating missing parent objects
    pub fn set_value(&self, path: impl IntoTargetPath, value: Value) -> Result<(), ProgramError> {
        let path = path.into_target_path()?;
        let mut scope = self.scope.write();
        if let Some(parent) = path.parent() {
            scope.ensure_object(&parent)?;
        }
        scope.set_value(&path, value)?;
        Ok(())
    }

    // ========================================================================
    // Sources
    // ========================================================================

    /// Add a block of program text
    pub fn add_source(&self, label: &str, text: impl Into<String>) -> BlockId {
        self.sources.write().add(label, None, text)
    }

    /// Add a block of text contributed by a hack
    pub fn add_hack_source(&self, hack: &str, label: &str, text: impl Into<String>) -> BlockId {
        self.sources.write().add(label, Some(hack), text)
    }

    /// Read access to the source blocks
    pub fn sources(&self) -> RwLockReadGuard<'_, SourceSet> {
        self.sources.read()
    }

    /// Write access to the source blocks
    pub fn sources_mut(&self) -> RwLockWriteGuard<'_, SourceSet> {
        self.sources.write()
    }

    /// Current text of the first block with a label
    pub fn source_text(&self, label: &str) -> Option<String> {
        self.sources.read().text_of(label).map(str::to_string)
    }

    // ========================================================================
    // Subsystems
    // ========================================================================

    /// Register a subsystem rebuilt after source patches
    pub fn add_subsystem(&self, subsystem: Arc<dyn Subsystem>) {
        tracing::debug!("Registered subsystem '{}'", subsystem.name());
        self.subsystems.write().push(subsystem);
    }

    /// Register a subsystem from a closure
    pub fn add_subsystem_fn<F>(&self, name: &str, rebuild: F)
    where
        F: Fn(&Program) -> Result<(), ProgramError> + Send + Sync + 'static,
    {
        self.add_subsystem(Arc::new(FnSubsystem {
            name: name.to_string(),
            rebuild,
        }));
    }

    /// Number of registered subsystems
    pub fn subsystem_count(&self) -> usize {
        self.subsystems.read().len()
    }

    /// Rebuild every subsystem in registration order
    ///
    /// Stops at the first failure. Returns the number of subsystems rebuilt.
    pub fn rebuild_subsystems(&self) -> Result<usize, ProgramError> {
        let subsystems: Vec<Arc<dyn Subsystem>> = self.subsystems.read().clone();

        for subsystem in &subsystems {
            subsystem.rebuild(self).map_err(|e| ProgramError::Subsystem {
                name: subsystem.name().to_string(),
                reason: e.to_string(),
            })?;
            tracing::debug!("Rebuilt subsystem '{}'", subsystem.name());
        }

        Ok(subsystems.len())
    }

    // ========================================================================
    // Host callbacks
    // ========================================================================

    /// Bind a host callback to the function currently at `path`
    ///
    /// The function is captured now. Later replacements of the slot are only
    /// seen after [`Program::rebind_callbacks`].
    pub fn bind_callback(&self, name: &str, path: impl IntoTargetPath) -> Result<(), ProgramError> {
        let path = path.into_target_path()?;
        let function = self.scope.read().function(&path)?;
        self.callbacks
            .write()
            .insert(name.to_string(), CallbackBinding { path, function });
        Ok(())
    }

    /// Re-capture every bound callback from its path
    ///
    /// Returns the number of callbacks rebound.
    pub fn rebind_callbacks(&self) -> Result<usize, ProgramError> {
        let scope = self.scope.read();
        let mut callbacks = self.callbacks.write();

        for (name, binding) in callbacks.iter_mut() {
            binding.function = scope.function(&binding.path)?;
            tracing::trace!("Rebound callback '{}' to {}", name, binding.path);
        }

        Ok(callbacks.len())
    }

    /// Invoke a bound callback
    ///
    /// A callback bound to an undefined slot does nothing.
    pub fn fire_callback(&self, name: &str, args: Args) -> Result<Call, ProgramError> {
        let function = {
            let callbacks = self.callbacks.read();
            let binding = callbacks
                .get(name)
                .ok_or_else(|| ProgramError::UnknownCallback(name.to_string()))?;
            binding.function.clone()
        };

        match function {
            Some(f) => f.call(args),
            None => Ok(Call::empty()),
        }
    }

    // ========================================================================
    // Data tables
    // ========================================================================

    /// Snapshot of a named table
    pub fn table(&self, name: &str) -> Option<Value> {
        self.tables.get(name).map(|entry| entry.value().clone())
    }

    /// Replace a named table
    pub fn set_table(&self, name: &str, value: Value) -> Option<Value> {
        self.tables.insert(name.to_string(), value)
    }

    /// Modify a named table in place, creating it as `null` if missing
    pub fn update_table<F, R>(&self, name: &str, update: F) -> R
    where
        F: FnOnce(&mut Value) -> R,
    {
        let mut entry = self.tables.entry(name.to_string()).or_insert(Value::Null);
        update(entry.value_mut())
    }

    /// Names of all tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }
}
