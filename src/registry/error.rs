//! Module loading error types.

use super::ModuleKind;
use thiserror::Error;

/// Errors surfaced while resolving extension modules.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module `{0}` is not known to the loader")]
    Unknown(String),

    #[error("module `{id}` is a {actual} module, expected {expected}")]
    WrongKind {
        id: String,
        expected: ModuleKind,
        actual: ModuleKind,
    },

    #[error("module `{id}` failed to load")]
    Failed {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}
