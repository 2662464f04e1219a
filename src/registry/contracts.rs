//! Extension-module contracts.
//!
//! Two module kinds plug into the pipeline:
//!
//! - [`QueryRunner`] — resolves dynamic includes: given a query id and
//!   decoded parameters, produces the data to mount.
//! - [`PostProcessor`] — ingestion hooks: may rewrite file content
//!   before insertion and run side-effecting work after store
//!   mutations (auxiliary indices and the like).
//!
//! Hook failures are not caught by the store or resolver; they
//! propagate to the caller, which decides whether to abandon the file.

use crate::store::{DocStore, FileBody};
use anyhow::Result;
use serde_json::{Map, Value};
use std::path::Path;

/// Context handed to post-processor hooks.
pub struct HookContext<'a> {
    /// Ingestion base directory; absent for removals, which only know
    /// the store-relative path.
    pub base_dir: Option<&'a Path>,
    /// Store-relative file path of the document being processed.
    pub file: &'a str,
    /// The store issuing the hook, for lookups and auxiliary work.
    pub store: &'a DocStore,
}

/// Query execution contract for dynamic includes.
///
/// A repeated query parameter arrives as an array value, a single one
/// as a string.
pub trait QueryRunner: Send + Sync {
    fn run(&self, query_id: &str, params: &Map<String, Value>) -> Result<Value>;
}

/// Ingestion hooks; every hook is optional via its default impl.
pub trait PostProcessor: Send + Sync {
    /// Rewrite file content before insertion. The default passes the
    /// body through unchanged.
    fn process_file(&self, _ctx: &HookContext<'_>, body: FileBody) -> Result<FileBody> {
        Ok(body)
    }

    /// Side-effecting hook after a document is inserted.
    fn store_add(&self, _ctx: &HookContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Side-effecting hook after a document is removed.
    fn store_remove(&self, _ctx: &HookContext<'_>) -> Result<()> {
        Ok(())
    }
}
