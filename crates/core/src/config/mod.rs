//! Configuration system for hackkit
//!
//! This module provides:
//! - [`CoreConfig`] - toolkit settings (entry point, patch strictness, dialog targets)
//! - [`HackOptions`] - trait-based per-hack option files
//! - TOML file format with auto-generation of defaults
//!
//! # Example
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use hackkit_core::HackOptions;
//!
//! #[derive(Default, Serialize, Deserialize)]
//! pub struct TransparentSprites {
//!     pub is_transparent: bool,
//! }
//!
//! impl HackOptions for TransparentSprites {
//!     const HACK_NAME: &'static str = "transparent-sprites";
//! }
//!
//! let options = TransparentSprites::load().unwrap_or_default();
//! ```

mod loader;

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use hackkit_sdk::targets;

use loader::{load_or_create, read_toml, write_toml};

pub use loader::{configs_dir, core_config_path, hack_options_path, hackkit_base_dir, BASE_DIR_ENV};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Could not determine the base directory
    #[error("Config directory not available - could not resolve hackkit base path")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Per-hack option types.
///
/// Every hack exposes a handful of options users tweak before building their
/// game. The default location is
/// `<base>/configs/hacks/{HACK_NAME}/{HACK_NAME}.toml`; the `*_from`/`*_to`
/// variants take an explicit file instead.
pub trait HackOptions: Default + Serialize + DeserializeOwned + Send + Sync {
    /// Name of the hack owning these options
    const HACK_NAME: &'static str;

    /// Where the options live by default
    fn options_path() -> ConfigResult<PathBuf> {
        hack_options_path(Self::HACK_NAME)
    }

    /// Load options from the default location, creating defaults if missing.
    fn load() -> ConfigResult<Self> {
        Self::load_from(Self::options_path()?)
    }

    /// Load options from `path`, writing defaults there if it is missing.
    fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        load_or_create(path.as_ref(), Self::HACK_NAME)
    }

    fn save(&self) -> ConfigResult<()> {
        self.save_to(Self::options_path()?)
    }

    fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        write_toml(path.as_ref(), self)
    }

    /// Replace these options with what is on disk.
    fn reload(&mut self) -> ConfigResult<()> {
        self.reload_from(Self::options_path()?)
    }

    fn reload_from(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        *self = read_toml(path.as_ref())?;
        tracing::debug!("Reloaded options for {} from {:?}", Self::HACK_NAME, path.as_ref());
        Ok(())
    }
}

/// Start-up wrapping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Path of the program's start-up entry point
    pub entry_point: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            entry_point: targets::START_EXPORTED_GAME.to_string(),
        }
    }
}

/// Source patching settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Reject patches whose matcher occurs more than once in the target block
    pub strict_single_match: bool,
}

/// Targets used by dialog tag helpers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Object dialog tag functions are installed under
    pub functions_root: String,

    /// Function parsing the game data (tag syntax is converted before it)
    pub world_parser: String,

    /// Function called when a dialog box closes (deferred tags run after it)
    pub exit_dialog: String,

    /// Function resetting game data (pending deferred tags are dropped after it)
    pub clear_game_data: String,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            functions_root: targets::DIALOG_FUNCTIONS_ROOT.to_string(),
            world_parser: targets::PARSE_WORLD.to_string(),
            exit_dialog: targets::ON_EXIT_DIALOG.to_string(),
            clear_game_data: targets::CLEAR_GAME_DATA.to_string(),
        }
    }
}

/// Core toolkit configuration.
///
/// Loaded from `<base>/configs/core.toml`, or from any path with
/// [`CoreConfig::load_from`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    pub bootstrap: BootstrapConfig,

    pub patching: PatchConfig,

    pub dialog: DialogConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            bootstrap: BootstrapConfig::default(),
            patching: PatchConfig::default(),
            dialog: DialogConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Parse from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load core config from the default location, creating it if missing.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(core_config_path()?)
    }

    /// Load core config from `path`, creating a default file if missing.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        load_or_create(path.as_ref(), "core")
    }

    /// Save core config to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(core_config_path()?)
    }

    /// Save core config to `path`.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        write_toml(path.as_ref(), self)
    }

    /// Reload core config from `path`.
    pub fn reload_from(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        *self = read_toml(path.as_ref())?;
        tracing::debug!("Reloaded core config from {:?}", path.as_ref());
        Ok(())
    }
}
