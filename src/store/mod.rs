//! Path-indexed in-memory document store.
//!
//! Ingested files are mirrored as a tree keyed by path segments; every
//! level aggregates the documents at or below it in a [`LevelIndex`],
//! giving O(1) access at any subtree to "all documents under here" and
//! "all documents of variant X under here".
//!
//! # Architecture
//!
//! ```text
//! add(base_dir, rel_path)
//!     │
//!     ├── MemoCache ──► FileSource::fetch (only on miss / cache bypass)
//!     ├── PostProcessor::process_file (optional rewrite)
//!     ├── tree walk: create levels, insert leaf, append to every
//!     │   visited LevelIndex (main or variants[name])
//!     └── PostProcessor::store_add (side effects)
//!
//! get(rel_path) ──► segment walk against the live tree
//!
//! promote_stage() ──► staging tree swapped into the live slot
//! ```
//!
//! Writers build full rebuilds into the staging tree while readers keep
//! using the live one; promotion replaces the whole live tree in one
//! step. Incremental `add`/`remove`/`update` calls against the live
//! tree are serialized by the caller.

mod source;
mod tree;

pub use source::{FileBody, FileSource, FsSource};
pub use tree::{DocRef, Document, LevelIndex, Node, TreeNode, variant_name};

use crate::cache::MemoCache;
use crate::config::{self, Config};
use crate::log;
use crate::registry::{HookContext, PostProcessor};
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Options & Lookup Results
// ============================================================================

/// Per-call ingestion options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    /// Insert into the staging tree instead of the live tree.
    pub use_stage: bool,
    /// Reuse a memoized file body when one exists.
    pub use_cache: bool,
}

/// Result of a store lookup.
#[derive(Debug)]
pub enum Lookup {
    /// A document leaf.
    Doc(DocRef),
    /// A directory level: its child segment names and index snapshot.
    Node {
        children: Vec<String>,
        index: LevelIndex,
    },
    /// A level's index, addressed through the reserved key segment.
    Index(LevelIndex),
}

// ============================================================================
// Store
// ============================================================================

/// The tree-indexed document store.
pub struct DocStore {
    config: Arc<Config>,
    source: Box<dyn FileSource>,
    cache: MemoCache<FileBody>,
    live: RwLock<TreeNode>,
    stage: RwLock<TreeNode>,
    post: RwLock<Option<Arc<dyn PostProcessor>>>,
}

impl DocStore {
    /// Create a store over `source` using the process-wide config.
    pub fn new(source: Box<dyn FileSource>) -> Self {
        Self::with_config(source, config::cfg())
    }

    /// Create a store over `source` with an explicit config.
    pub fn with_config(source: Box<dyn FileSource>, config: Arc<Config>) -> Self {
        Self {
            config,
            source,
            cache: MemoCache::new(),
            live: RwLock::new(TreeNode::default()),
            stage: RwLock::new(TreeNode::default()),
            post: RwLock::new(None),
        }
    }

    /// Wire in the ingestion post-processor (usually from the module
    /// registry at composition time).
    pub fn set_post_processor(&self, post: Option<Arc<dyn PostProcessor>>) {
        *self.post.write() = post;
    }

    /// The file-body cache, for external invalidation by a watch layer.
    pub fn cache(&self) -> &MemoCache<FileBody> {
        &self.cache
    }

    /// Ingest the file at `rel_path` under `base_dir`.
    ///
    /// Refuses silently on an empty path; skip-and-warns on a path
    /// containing the reserved index key. Content is fetched through
    /// the cache (`use_cache` and a hit reuse the memoized body;
    /// otherwise the source is read and the cache refreshed), handed
    /// to the `process_file` hook, and inserted into the tree with
    /// every visited level's index updated. Re-adding an existing path
    /// replaces the document everywhere.
    ///
    /// # Errors
    ///
    /// Source read failures and hook failures propagate; the tree is
    /// only mutated after both have succeeded.
    pub fn add(&self, base_dir: &Path, rel_path: &str, opts: AddOptions) -> Result<()> {
        let segments = split_segments(rel_path);
        let Some(file_name) = segments.last().copied() else {
            return Ok(());
        };

        let reserved = self.config.store.reserved_key.as_str();
        if segments.iter().any(|s| *s == reserved) {
            log!("store"; "skipping `{}`: contains reserved segment `{}`", rel_path, reserved);
            return Ok(());
        }

        let namespace = self.config.store.cache_namespace.as_str();
        let cache_key = base_dir.join(rel_path).to_string_lossy().into_owned();

        let cached = if opts.use_cache {
            self.cache.get(namespace, &cache_key)
        } else {
            None
        };
        let body = match cached {
            Some(body) => body,
            None => {
                let body = self
                    .source
                    .fetch(base_dir, rel_path)
                    .with_context(|| format!("failed to read `{rel_path}`"))?;
                self.cache.set(namespace, &cache_key, body.clone());
                body
            }
        };

        let post = self.post.read().clone();
        let body = match &post {
            Some(pp) => pp.process_file(
                &HookContext {
                    base_dir: Some(base_dir),
                    file: rel_path,
                    store: self,
                },
                body,
            )?,
            None => body,
        };

        let variant = variant_name(file_name, &self.config.store.variant_separator);
        let doc: DocRef = Arc::new(RwLock::new(Document {
            origin: rel_path.to_owned(),
            raw: body.raw,
            parsed: body.parsed,
        }));

        {
            let tree = if opts.use_stage { &self.stage } else { &self.live };
            let mut root = tree.write();

            if path_blocked(&root, &segments) {
                log!("store"; "skipping `{}`: a document occupies an intermediate segment", rel_path);
                return Ok(());
            }
            // Replacing an existing leaf unlinks the old document from
            // every index level first.
            remove_at(&mut root, &segments, variant.as_deref());
            insert_at(&mut root, &segments, variant.as_deref(), &doc);
        }

        if let Some(pp) = &post {
            pp.store_add(&HookContext {
                base_dir: Some(base_dir),
                file: rel_path,
                store: self,
            })?;
        }
        Ok(())
    }

    /// Remove the document at `rel_path` from the live tree.
    ///
    /// Deletes the leaf, removes the document from every visited
    /// level's index, and prunes variant groups that become empty.
    /// Absent paths are a graceful no-op; the `store_remove` hook runs
    /// only when a document was actually removed.
    ///
    /// # Errors
    ///
    /// Hook failures propagate.
    pub fn remove(&self, rel_path: &str) -> Result<()> {
        let segments = split_segments(rel_path);
        let Some(file_name) = segments.last().copied() else {
            return Ok(());
        };
        let variant = variant_name(file_name, &self.config.store.variant_separator);

        let removed = {
            let mut root = self.live.write();
            remove_at(&mut root, &segments, variant.as_deref())
        };

        if removed.is_some() {
            if let Some(pp) = self.post.read().clone() {
                pp.store_remove(&HookContext {
                    base_dir: None,
                    file: rel_path,
                    store: self,
                })?;
            }
        }
        Ok(())
    }

    /// Re-ingest `rel_path`: remove, then add with a forced re-read.
    ///
    /// Not atomic; a reader between the two steps observes the
    /// document as absent.
    ///
    /// # Errors
    ///
    /// Propagates `remove`/`add` failures.
    pub fn update(&self, base_dir: &Path, rel_path: &str) -> Result<()> {
        self.remove(rel_path)?;
        self.add(
            base_dir,
            rel_path,
            AddOptions {
                use_stage: false,
                use_cache: false,
            },
        )
    }

    /// Look up `rel_path` in the live tree.
    ///
    /// A trailing reserved-key segment addresses the level's index.
    /// Any missing segment yields `None`, never an error.
    pub fn get(&self, rel_path: &str) -> Option<Lookup> {
        let segments = split_segments(rel_path);
        if segments.is_empty() {
            return None;
        }
        let reserved = self.config.store.reserved_key.as_str();

        let root = self.live.read();
        let mut node: &TreeNode = &root;
        for (i, seg) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            if *seg == reserved {
                return last.then(|| Lookup::Index(node.index.clone()));
            }
            match node.children.get(*seg) {
                Some(Node::Branch(next)) => {
                    if last {
                        return Some(Lookup::Node {
                            children: next.child_names(),
                            index: next.index.clone(),
                        });
                    }
                    node = next;
                }
                Some(Node::Doc(doc)) => {
                    return last.then(|| Lookup::Doc(doc.clone()));
                }
                None => return None,
            }
        }
        None
    }

    /// Snapshot of the root level's index (every document in the store).
    pub fn root_index(&self) -> LevelIndex {
        self.live.read().index.clone()
    }

    /// Atomically replace the live tree with the staging tree and
    /// reset staging to the empty skeleton.
    pub fn promote_stage(&self) {
        let mut live = self.live.write();
        let mut stage = self.stage.write();
        *live = std::mem::take(&mut *stage);
    }
}

// ============================================================================
// Tree Walks
// ============================================================================

/// Split a relative path into its non-empty segments.
fn split_segments(rel_path: &str) -> Vec<&str> {
    rel_path.split('/').filter(|s| !s.is_empty()).collect()
}

/// True when a document occupies any intermediate segment of the path.
fn path_blocked(root: &TreeNode, segments: &[&str]) -> bool {
    let mut node = root;
    for seg in &segments[..segments.len() - 1] {
        match node.children.get(*seg) {
            Some(Node::Branch(next)) => node = next,
            Some(Node::Doc(_)) => return true,
            None => return false,
        }
    }
    false
}

/// Insert `doc` at the path, creating intermediate levels (each seeded
/// with an empty index) and appending to every visited level's index.
fn insert_at(root: &mut TreeNode, segments: &[&str], variant: Option<&str>, doc: &DocRef) {
    let Some((file_name, dirs)) = segments.split_last() else {
        return;
    };

    let mut node = root;
    node.index.insert(variant, doc);
    for seg in dirs {
        let child = node
            .children
            .entry((*seg).to_owned())
            .or_insert_with(|| Node::Branch(TreeNode::default()));
        match child {
            Node::Branch(next) => {
                next.index.insert(variant, doc);
                node = next;
            }
            // Guarded by path_blocked before any index was touched.
            Node::Doc(_) => unreachable!("blocked paths are rejected before insertion"),
        }
    }
    node.children
        .insert((*file_name).to_owned(), Node::Doc(doc.clone()));
}

/// Remove the document at the path, unlinking it from every visited
/// level's index on the way back up.
///
/// Descends through directory segments only; the leaf segment is
/// deleted from its parent, never stepped into.
fn remove_at(node: &mut TreeNode, segments: &[&str], variant: Option<&str>) -> Option<DocRef> {
    let (seg, rest) = segments.split_first()?;
    let removed = if rest.is_empty() {
        match node.children.get(*seg) {
            Some(Node::Doc(_)) => match node.children.remove(*seg) {
                Some(Node::Doc(doc)) => Some(doc),
                _ => None,
            },
            _ => None,
        }
    } else {
        match node.children.get_mut(*seg) {
            Some(Node::Branch(child)) => remove_at(child, rest, variant),
            _ => None,
        }
    };

    if let Some(doc) = &removed {
        node.index.remove(variant, doc);
    }
    removed
}

// ============================================================================
// Tests
// ============================================================================
