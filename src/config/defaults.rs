//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [store] Section Defaults
// ============================================================================

pub mod store {
    pub fn reserved_key() -> String {
        "_json".into()
    }

    pub fn variant_separator() -> String {
        "--".into()
    }

    pub fn cache_namespace() -> String {
        "files".into()
    }
}

// ============================================================================
// [modules] Section Defaults
// ============================================================================

pub mod modules {
    pub fn query() -> Vec<String> {
        Vec::new()
    }

    pub fn query_runner() -> Option<String> {
        None
    }

    pub fn post_processor() -> Option<String> {
        None
    }
}

// ============================================================================
// [resolve] Section Defaults
// ============================================================================

pub mod resolve {
    pub fn include_field() -> String {
        "includes".into()
    }

    pub fn query_suffix() -> String {
        "queryInclude".into()
    }
}
