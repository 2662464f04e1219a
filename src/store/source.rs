//! File ingestion pull contract.
//!
//! The store depends only on `(base_dir, relative_path) -> FileBody`;
//! how files are discovered is the caller's concern. [`FsSource`] is
//! the disk implementation; tests substitute in-memory sources.

use serde_json::Value;
use std::{fs, io, path::Path};

/// Raw and parsed body of one fetched file.
///
/// `parsed` is `Some` only when the raw body was valid JSON; malformed
/// content falls back to the raw representation, never an error.
#[derive(Debug, Clone)]
pub struct FileBody {
    pub raw: String,
    pub parsed: Option<Value>,
}

impl FileBody {
    /// Build a body from raw text, attempting a JSON parse.
    pub fn from_raw(raw: String) -> Self {
        let parsed = serde_json::from_str(&raw).ok();
        Self { raw, parsed }
    }
}

/// Pull contract supplying file content to the store.
pub trait FileSource: Send + Sync {
    /// Fetch the file at `rel_path` under `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `io::Error` when the file cannot be read.
    fn fetch(&self, base_dir: &Path, rel_path: &str) -> io::Result<FileBody>;
}

/// Disk-backed file source.
#[derive(Debug, Default)]
pub struct FsSource;

impl FileSource for FsSource {
    fn fetch(&self, base_dir: &Path, rel_path: &str) -> io::Result<FileBody> {
        let raw = fs::read_to_string(base_dir.join(rel_path))?;
        Ok(FileBody::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_body_parses_json() {
        let body = FileBody::from_raw(r#"{"title": "hello"}"#.to_string());
        assert_eq!(body.parsed, Some(json!({"title": "hello"})));
    }

    #[test]
    fn test_file_body_raw_fallback() {
        let body = FileBody::from_raw("not json at all".to_string());
        assert_eq!(body.raw, "not json at all");
        assert_eq!(body.parsed, None);
    }

    #[test]
    fn test_fs_source_fetch() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("en")).unwrap();
        fs::write(dir.path().join("en/a.json"), r#"{"id": 1}"#).unwrap();

        let body = FsSource.fetch(dir.path(), "en/a.json").unwrap();
        assert_eq!(body.parsed, Some(json!({"id": 1})));
    }

    #[test]
    fn test_fs_source_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(FsSource.fetch(dir.path(), "missing.json").is_err());
    }
}
