//! Store configuration management for `canopy.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[store]`    | Tree layout (reserved key, variant separator)    |
//! | `[modules]`  | Extension modules loaded at startup              |
//! | `[resolve]`  | Include resolution (metadata field, query suffix)|
//!
//! # Example
//!
//! ```toml
//! [store]
//! reserved_key = "_json"
//! variant_separator = "--"
//!
//! [modules]
//! query = ["query/related", "query/latest"]
//! query_runner = "query/runner"
//! post_processor = "hooks/main"
//!
//! [resolve]
//! include_field = "includes"
//! ```

pub mod defaults;
mod error;
mod handle;

pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_from_path};

use serde::Deserialize;
use std::{fs, path::Path};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing canopy.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Tree and index layout settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Extension module settings
    #[serde(default)]
    pub modules: ModulesConfig,

    /// Include resolution settings
    #[serde(default)]
    pub resolve: ResolveConfig,
}

impl Config {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Validate configuration consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.reserved_key.is_empty() {
            return Err(ConfigError::Validation(
                "store.reserved_key must not be empty".into(),
            ));
        }
        if self.store.reserved_key.contains('/') {
            return Err(ConfigError::Validation(
                "store.reserved_key must be a single path segment".into(),
            ));
        }
        if self.store.variant_separator.is_empty() {
            return Err(ConfigError::Validation(
                "store.variant_separator must not be empty".into(),
            ));
        }
        if self.resolve.include_field.is_empty() {
            return Err(ConfigError::Validation(
                "resolve.include_field must not be empty".into(),
            ));
        }
        if !self
            .resolve
            .query_suffix
            .to_ascii_lowercase()
            .ends_with("include")
        {
            return Err(ConfigError::Validation(
                "resolve.query_suffix must end with `Include`".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// [store] Section
// ============================================================================

/// Tree and index layout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Index key attached to every tree level; rejected as an ordinary
    /// path segment during ingestion.
    #[serde(default = "defaults::store::reserved_key")]
    pub reserved_key: String,

    /// Separator between base name and variant name in file names
    /// (`base--variant.ext`).
    #[serde(default = "defaults::store::variant_separator")]
    pub variant_separator: String,

    /// Cache namespace used for memoized file bodies.
    #[serde(default = "defaults::store::cache_namespace")]
    pub cache_namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reserved_key: defaults::store::reserved_key(),
            variant_separator: defaults::store::variant_separator(),
            cache_namespace: defaults::store::cache_namespace(),
        }
    }
}

// ============================================================================
// [modules] Section
// ============================================================================

/// Extension module settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    /// Query module ids loaded eagerly at registry init.
    #[serde(default = "defaults::modules::query")]
    pub query: Vec<String>,

    /// Module id of the query runner used for dynamic includes.
    #[serde(default = "defaults::modules::query_runner")]
    pub query_runner: Option<String>,

    /// Module id of the ingestion post-processor.
    #[serde(default = "defaults::modules::post_processor")]
    pub post_processor: Option<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            query: defaults::modules::query(),
            query_runner: defaults::modules::query_runner(),
            post_processor: defaults::modules::post_processor(),
        }
    }
}

// ============================================================================
// [resolve] Section
// ============================================================================

/// Include resolution settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveConfig {
    /// Metadata field holding the ordered reference-path list.
    #[serde(default = "defaults::resolve::include_field")]
    pub include_field: String,

    /// Trailing key-name suffix marking a dynamic (query-driven) include.
    #[serde(default = "defaults::resolve::query_suffix")]
    pub query_suffix: String,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            include_field: defaults::resolve::include_field(),
            query_suffix: defaults::resolve::query_suffix(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
