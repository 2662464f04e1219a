//! Tree nodes, per-level indices, and document handles.
//!
//! The store mirrors ingested file paths as a tree of [`TreeNode`]s.
//! Every node owns a [`LevelIndex`] aggregating all documents at or
//! below it, split into the `main` sequence and per-variant sequences.
//! A document handle is an `Arc`, so the same allocation appears in its
//! own directory level and in every ancestor's index up to the root.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Parsed (or raw) content of one ingested file.
#[derive(Debug, Clone)]
pub struct Document {
    /// Originating file path, relative to the ingestion root.
    pub origin: String,
    /// Raw file body.
    pub raw: String,
    /// Structured body; `None` when the raw body was not valid JSON.
    pub parsed: Option<Value>,
}

/// Shared, in-place-mutable document handle.
///
/// The resolver rewrites `parsed` through this lock when it embeds
/// resolved includes.
pub type DocRef = Arc<RwLock<Document>>;

/// One child slot of a tree node.
#[derive(Debug)]
pub enum Node {
    /// An intermediate directory level.
    Branch(TreeNode),
    /// A document leaf, keyed by its file-name segment.
    Doc(DocRef),
}

/// A directory level: child slots plus the level's aggregation index.
///
/// Nodes are always created with a well-formed empty index, so reading
/// the index of any existing level is safe.
#[derive(Debug, Default)]
pub struct TreeNode {
    pub children: FxHashMap<String, Node>,
    pub index: LevelIndex,
}

impl TreeNode {
    /// Sorted child segment names (for stable snapshots).
    pub fn child_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.children.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

/// Per-level aggregation of all documents beneath a tree node.
#[derive(Debug, Clone, Default)]
pub struct LevelIndex {
    /// Non-variant documents, in ingestion order.
    pub main: Vec<DocRef>,
    /// Variant-name → documents of that variant, in ingestion order.
    pub variants: FxHashMap<String, Vec<DocRef>>,
}

impl LevelIndex {
    /// Append a document to `main` or to its variant sequence.
    pub fn insert(&mut self, variant: Option<&str>, doc: &DocRef) {
        match variant {
            Some(name) => self
                .variants
                .entry(name.to_owned())
                .or_default()
                .push(doc.clone()),
            None => self.main.push(doc.clone()),
        }
    }

    /// Remove a document from `main` or from its variant sequence,
    /// dropping a variant group that becomes empty.
    pub fn remove(&mut self, variant: Option<&str>, doc: &DocRef) {
        match variant {
            Some(name) => {
                if let Some(docs) = self.variants.get_mut(name) {
                    docs.retain(|d| !Arc::ptr_eq(d, doc));
                    if docs.is_empty() {
                        self.variants.remove(name);
                    }
                }
            }
            None => self.main.retain(|d| !Arc::ptr_eq(d, doc)),
        }
    }

    /// True when the index holds no documents at all.
    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.variants.is_empty()
    }
}

/// Derive the variant name from a file-name segment.
///
/// `article--teaser.json` → `Some("teaser")`; a name without the
/// separator is the main representative and yields `None`. The
/// extension (everything after the last `.`) is ignored.
pub fn variant_name(file_name: &str, separator: &str) -> Option<String> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => file_name,
    };
    let (_base, variant) = stem.split_once(separator)?;
    if variant.is_empty() {
        return None;
    }
    Some(variant.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(origin: &str) -> DocRef {
        Arc::new(RwLock::new(Document {
            origin: origin.to_string(),
            raw: String::new(),
            parsed: None,
        }))
    }

    #[test]
    fn test_variant_name_main() {
        assert_eq!(variant_name("41234.json", "--"), None);
        assert_eq!(variant_name("article", "--"), None);
    }

    #[test]
    fn test_variant_name_with_variant() {
        assert_eq!(
            variant_name("41234--teaser.json", "--"),
            Some("teaser".to_string())
        );
        assert_eq!(variant_name("a--b", "--"), Some("b".to_string()));
    }

    #[test]
    fn test_variant_name_separator_in_variant() {
        // Everything after the first separator belongs to the variant
        assert_eq!(
            variant_name("x--a--b.json", "--"),
            Some("a--b".to_string())
        );
    }

    #[test]
    fn test_variant_name_empty_variant() {
        assert_eq!(variant_name("x--.json", "--"), None);
    }

    #[test]
    fn test_variant_name_dotted_stem() {
        // Only the last `.` starts the extension
        assert_eq!(
            variant_name("a.b--teaser.json", "--"),
            Some("teaser".to_string())
        );
    }

    #[test]
    fn test_index_insert_main_and_variant() {
        let mut index = LevelIndex::default();
        let a = doc("a.json");
        let b = doc("b--teaser.json");

        index.insert(None, &a);
        index.insert(Some("teaser"), &b);

        assert_eq!(index.main.len(), 1);
        assert_eq!(index.variants["teaser"].len(), 1);
        assert!(Arc::ptr_eq(&index.main[0], &a));
    }

    #[test]
    fn test_index_remove_prunes_empty_variant_group() {
        let mut index = LevelIndex::default();
        let a = doc("a--teaser.json");
        let b = doc("b--teaser.json");

        index.insert(Some("teaser"), &a);
        index.insert(Some("teaser"), &b);

        index.remove(Some("teaser"), &a);
        assert_eq!(index.variants["teaser"].len(), 1);

        index.remove(Some("teaser"), &b);
        assert!(!index.variants.contains_key("teaser"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_index_remove_is_identity_based() {
        let mut index = LevelIndex::default();
        let a = doc("a.json");
        let twin = doc("a.json");

        index.insert(None, &a);
        index.remove(None, &twin);

        // Same origin, different allocation: nothing removed
        assert_eq!(index.main.len(), 1);
    }

    #[test]
    fn test_tree_node_child_names_sorted() {
        let mut node = TreeNode::default();
        node.children
            .insert("b".into(), Node::Branch(TreeNode::default()));
        node.children
            .insert("a".into(), Node::Doc(doc("a.json")));

        assert_eq!(node.child_names(), vec!["a", "b"]);
    }
}
