//! Include resolution.
//!
//! A document declares the references it wants embedded as an ordered
//! list of dot-delimited paths under its include metadata field. Two
//! passes consume that list, both mutating the document in place:
//!
//! - **static** — the referenced string addresses another document in
//!   the store; the trailing segment's suffix routes to a mounting
//!   strategy (entity, config, custom, locale).
//! - **dynamic** — the trailing segment ends in the query suffix; the
//!   referenced string is `queryId?params`, executed through the
//!   configured query runner and mounted with the generic alias
//!   strategy.
//!
//! The passes are independent of each other; within a pass, references
//! are processed in declaration order, so later mounts may overwrite
//! earlier ones when paths collide.

mod mount;
mod query;

pub use mount::{
    AliasMount, ConfigMount, CustomMount, EntityMount, LocaleMount, MountStrategy, MountTable,
    alias_for,
};
pub use query::{QueryRef, decode_params, parse_query_ref};

use crate::config::{self, Config};
use crate::log;
use crate::registry::{ModuleRegistry, QueryRunner};
use crate::store::{DocRef, DocStore, Lookup};
use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Resolves a document's declared includes against the store and the
/// query runner.
pub struct IncludeResolver {
    config: Arc<Config>,
    table: MountTable,
}

impl IncludeResolver {
    /// Create a resolver using the process-wide config.
    pub fn new() -> Self {
        Self::with_config(config::cfg())
    }

    /// Create a resolver with an explicit config.
    pub fn with_config(config: Arc<Config>) -> Self {
        Self {
            config,
            table: MountTable::builtin(),
        }
    }

    /// The mounting-strategy table, for registering extensions.
    pub fn table_mut(&mut self) -> &mut MountTable {
        &mut self.table
    }

    /// Run both passes on one document.
    ///
    /// The dynamic pass runs only when a query runner is configured;
    /// declared query includes are left untouched otherwise.
    ///
    /// # Errors
    ///
    /// Propagates runner load failures and query execution failures.
    pub fn resolve(
        &self,
        doc: &DocRef,
        store: &DocStore,
        registry: &ModuleRegistry,
    ) -> Result<()> {
        self.resolve_static(doc, store);
        if let Some(runner) = registry.configured_query_runner()? {
            self.resolve_dynamic(doc, runner.as_ref())?;
        }
        Ok(())
    }

    /// Run both passes on every document in the store.
    ///
    /// # Errors
    ///
    /// Stops at the first failing document.
    pub fn resolve_store(&self, store: &DocStore, registry: &ModuleRegistry) -> Result<()> {
        let index = store.root_index();
        for doc in index.main.iter().chain(index.variants.values().flatten()) {
            self.resolve(doc, store, registry)?;
        }
        Ok(())
    }

    /// Static pass: embed store-addressed references.
    ///
    /// The mounting strategy runs even when the store lookup misses;
    /// absent-data behavior is the strategy's own.
    pub fn resolve_static(&self, doc: &DocRef, store: &DocStore) {
        for ref_path in self.reference_paths(doc) {
            let segments: Vec<&str> = ref_path.split('.').collect();
            let Some(include_key) = segments.last().copied() else {
                continue;
            };
            if self.is_query_key(include_key) {
                continue;
            }
            let Some(strategy) = self.table.dispatch(include_key) else {
                continue;
            };
            let Some(target) = read_string_at(doc, &segments) else {
                continue;
            };

            let resolved = match store.get(&target) {
                Some(Lookup::Doc(found)) => found.read().parsed.clone(),
                _ => None,
            };
            mount_at(doc, &segments, strategy, resolved);
        }
    }

    /// Dynamic pass: execute query-driven references and embed their
    /// results.
    ///
    /// # Errors
    ///
    /// Query runner failures propagate and abort the pass.
    pub fn resolve_dynamic(&self, doc: &DocRef, runner: &dyn QueryRunner) -> Result<()> {
        for ref_path in self.reference_paths(doc) {
            let segments: Vec<&str> = ref_path.split('.').collect();
            let Some(include_key) = segments.last().copied() else {
                continue;
            };
            if !self.is_query_key(include_key) {
                continue;
            }
            let Some(target) = read_string_at(doc, &segments) else {
                continue;
            };
            let Some(query) = parse_query_ref(&target) else {
                continue;
            };

            let result = runner.run(&query.query_id, &query.params)?;
            mount_at(doc, &segments, &AliasMount, Some(result));
            log!("resolve"; "mounted query `{}` at `{}`", query.query_id, ref_path);
        }
        Ok(())
    }

    /// The document's declared reference paths, in declaration order.
    fn reference_paths(&self, doc: &DocRef) -> Vec<String> {
        doc.read()
            .parsed
            .as_ref()
            .and_then(|value| value.get(&self.config.resolve.include_field))
            .and_then(Value::as_array)
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(|p| p.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether an include key belongs to the dynamic pass.
    fn is_query_key(&self, include_key: &str) -> bool {
        include_key
            .to_lowercase()
            .ends_with(&self.config.resolve.query_suffix.to_lowercase())
    }
}

impl Default for IncludeResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Document Walks
// ============================================================================

/// Read the string value at a dot path inside the document.
fn read_string_at(doc: &DocRef, segments: &[&str]) -> Option<String> {
    let guard = doc.read();
    let mut value = guard.parsed.as_ref()?;
    for seg in segments {
        value = value.get(*seg)?;
    }
    value.as_str().map(str::to_owned)
}

/// Walk to the mount point and apply the strategy there.
///
/// Intermediate objects are created as needed; an existing non-object
/// intermediate aborts the mount, leaving the document untouched.
fn mount_at(doc: &DocRef, segments: &[&str], strategy: &dyn MountStrategy, resolved: Option<Value>) {
    let Some((include_key, dirs)) = segments.split_last() else {
        return;
    };

    let mut guard = doc.write();
    let Some(mut slot) = guard.parsed.as_mut().and_then(Value::as_object_mut) else {
        return;
    };
    for seg in dirs {
        let entry = slot
            .entry((*seg).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(next) = entry.as_object_mut() else {
            return;
        };
        slot = next;
    }
    strategy.mount(slot, include_key, resolved);
}

// ============================================================================
// Tests
// ============================================================================
