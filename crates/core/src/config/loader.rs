//! Config path resolution
//!
//! Handles resolving paths for configuration files. The base directory comes
//! from the `HACKKIT_DIR` environment variable, or the directory holding the
//! running executable.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the base directory
pub const BASE_DIR_ENV: &str = "HACKKIT_DIR";

/// Returns the hackkit base directory.
pub fn hackkit_base_dir() -> ConfigResult<PathBuf> {
    if let Some(dir) = std::env::var_os(BASE_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;
    exe.parent()
        .map(PathBuf::from)
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Returns the base configs directory.
///
/// Path: `<base>/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(hackkit_base_dir()?.join("configs"))
}

/// Returns the path for a hack's options file.
///
/// Path: `<base>/configs/hacks/{hack_name}/{hack_name}.toml`
pub fn hack_options_path(hack_name: &str) -> ConfigResult<PathBuf> {
    let base = configs_dir()?;
    Ok(base
        .join("hacks")
        .join(hack_name)
        .join(format!("{}.toml", hack_name)))
}

/// Returns the core toolkit config path.
///
/// Path: `<base>/configs/core.toml`
pub fn core_config_path() -> ConfigResult<PathBuf> {
    Ok(configs_dir()?.join("core.toml"))
}

/// Parse a TOML file.
pub(super) fn read_toml<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Write `value` as TOML, creating parent directories.
pub(super) fn write_toml<T: Serialize>(path: &Path, value: &T) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, toml::to_string_pretty(value)?)?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

/// Read `path`, or write and return the defaults when it does not exist yet.
///
/// `owner` only labels the log lines.
pub(super) fn load_or_create<T>(path: &Path, owner: &str) -> ConfigResult<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    if path.exists() {
        let value = read_toml(path)?;
        tracing::debug!("Loaded {} config from {:?}", owner, path);
        return Ok(value);
    }

    let value = T::default();
    write_toml(path, &value)?;
    tracing::info!("Created default {} config at {:?}", owner, path);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hack_options_path_format() {
        let path = hack_options_path("transparent-sprites").unwrap();
        assert!(path.ends_with("configs/hacks/transparent-sprites/transparent-sprites.toml"));
    }

    #[test]
    fn test_core_config_path_format() {
        let path = core_config_path().unwrap();
        assert!(path.ends_with("configs/core.toml"));
    }
}
