//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement,
//! so a long-lived process can re-read `canopy.toml` without pausing
//! readers.
//!
//! # Usage
//!
//! ```ignore
//! use canopy::config::cfg;
//!
//! let c = cfg();
//! let field = &c.resolve.include_field;  // Arc auto-derefs to &Config
//! ```

use super::{Config, ConfigError};
use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// Global config storage with atomic replacement support.
///
/// Initialized with defaults; replaced by `init_config` at startup and
/// by `reload_from_path` when the config file changes.
static CONFIG: LazyLock<ArcSwap<Config>> =
    LazyLock::new(|| ArcSwap::from_pointee(Config::default()));

/// Get current config as `Arc<Config>`.
///
/// Lock-free atomic load; the returned `Arc` stays valid even if the
/// config is replaced while it is held.
#[inline]
pub fn cfg() -> Arc<Config> {
    CONFIG.load_full()
}

/// Initialize global config (called once at startup).
#[inline]
pub fn init_config(config: Config) {
    CONFIG.store(Arc::new(config));
}

/// Replace config atomically from a file on disk.
///
/// Readers that loaded the old config keep it; new readers see the
/// updated one. On any error the current config is left in place.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn reload_from_path(path: &Path) -> Result<(), ConfigError> {
    let config = Config::from_path(path)?;
    config.validate()?;
    CONFIG.store(Arc::new(config));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cfg_returns_defaults() {
        // The global slot starts with defaults in any fresh process;
        // other tests may have replaced it, so only check shape here.
        let c = cfg();
        assert!(!c.store.reserved_key.is_empty());
    }

    #[test]
    fn test_reload_from_missing_path_keeps_config() {
        let before = cfg().store.reserved_key.clone();
        let result = reload_from_path(Path::new("/nonexistent/canopy.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
        assert_eq!(cfg().store.reserved_key, before);
    }
}
