//! Log output setup
//!
//! Hosts call [`init`] once before registering hacks. `RUST_LOG` overrides the
//! level chosen from the config's `debug` flag.

use tracing_subscriber::EnvFilter;

use crate::config::CoreConfig;

/// Default filter directive for a config
pub fn default_directive(config: &CoreConfig) -> &'static str {
    if config.debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the global fmt subscriber
///
/// Returns `false` if a subscriber was already installed.
pub fn init(config: &CoreConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("hackkit logging initialized (config version {})", config.version);
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let mut config = CoreConfig::default();
        assert_eq!(default_directive(&config), "info");
        config.debug = true;
        assert_eq!(default_directive(&config), "debug");
    }

    #[test]
    fn test_init_twice() {
        let config = CoreConfig::default();
        init(&config);
        assert!(!init(&config));
    }
}
