//! Navigation index for the tree view
//!
//! Maps every interior path down to depth 4 below `groups` to the sorted
//! list of its interior child paths. Leaves never appear. The root of
//! `groups` is keyed by the empty string.

use std::collections::BTreeMap;

use crate::document::{Document, NodeId};

/// Deepest level that is indexed (users are level 1)
pub const MAX_DEPTH: usize = 4;

/// Precomputed path to child-path mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl NavIndex {
    /// Build the index from scratch
    pub fn build(doc: &Document) -> Self {
        let mut index = Self::default();
        index.visit(doc, doc.groups(), String::new(), 0);
        index
    }

    fn visit(&mut self, doc: &Document, id: NodeId, path: String, depth: usize) {
        let mut children = Vec::new();
        if depth < MAX_DEPTH {
            for child in doc.children(id) {
                let interior = doc.kind(child).is_some_and(|k| !k.is_leaf());
                if !interior {
                    continue;
                }
                let Some(key) = doc.key(child) else { continue };
                let child_path = if path.is_empty() {
                    key.to_string()
                } else {
                    format!("{}.{}", path, key)
                };
                self.visit(doc, child, child_path.clone(), depth + 1);
                children.push(child_path);
            }
        }
        children.sort();
        self.entries.insert(path, children);
    }

    /// Sorted child paths of a path; empty when the path is unknown
    pub fn children_of(&self, path: &str) -> &[String] {
        self.entries.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if the path has an entry
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Pick the path a tree view should select first
    ///
    /// Keeps `current` when any 1 to 4 segment prefix of it is indexed,
    /// otherwise falls back to the smallest indexed path.
    pub fn resolve_initial(&self, current: &str) -> String {
        if !current.is_empty() {
            let segments: Vec<&str> = current.split('.').collect();
            let known = (1..=segments.len().min(MAX_DEPTH))
                .any(|n| self.entries.contains_key(&segments[..n].join(".")));
            if known {
                return current.to_string();
            }
        }
        self.entries
            .keys()
            .find(|k| !k.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// All indexed paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of indexed paths, including the root
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the index as an indented outline
    pub fn outline(&self) -> String {
        let mut output = String::new();
        self.outline_into("", 0, &mut output);
        output
    }

    fn outline_into(&self, path: &str, depth: usize, output: &mut String) {
        for child in self.children_of(path) {
            let name = child.rsplit('.').next().unwrap_or(child);
            output.push_str(&"  ".repeat(depth));
            output.push_str(name);
            output.push('\n');
            self.outline_into(child, depth + 1, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Document {
        Document::parse(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_scenario() {
        let doc = parse(
            r#"{"timeStamp":"Fri Jul 30 21:25:10 BST 2021","groups":{"UserA":{"notes":{"note":"hi"}}}}"#,
        );
        let nav = doc.nav();
        assert_eq!(nav.children_of(""), &["UserA".to_string()]);
        assert_eq!(nav.children_of("UserA"), &["UserA.notes".to_string()]);
        assert!(nav.contains("UserA.notes"));
        assert!(nav.children_of("UserA.notes").is_empty());
        assert_eq!(nav.len(), 3);
    }

    #[test]
    fn test_children_sorted_and_leaves_excluded() {
        let doc = parse(
            r#"{"timeStamp":"Fri Jul 30 21:25:10 BST 2021","groups":{"b":{"z":{},"a":{},"leaf":"x","n":4},"a":{}}}"#,
        );
        let nav = doc.nav();
        assert_eq!(nav.children_of(""), &["a".to_string(), "b".to_string()]);
        assert_eq!(nav.children_of("b"), &["b.a".to_string(), "b.z".to_string()]);
        assert!(!nav.contains("b.leaf"));
    }

    #[test]
    fn test_depth_limit() {
        let doc = parse(
            r#"{"timeStamp":"Fri Jul 30 21:25:10 BST 2021","groups":{"u":{"c":{"i":{"s":{"deep":{}}}}}}}"#,
        );
        let nav = doc.nav();
        assert_eq!(nav.children_of("u.c.i"), &["u.c.i.s".to_string()]);
        assert!(nav.contains("u.c.i.s"));
        assert!(nav.children_of("u.c.i.s").is_empty());
        assert!(!nav.contains("u.c.i.s.deep"));
    }

    #[test]
    fn test_resolve_initial() {
        let doc = parse(
            r#"{"timeStamp":"Fri Jul 30 21:25:10 BST 2021","groups":{"Zed":{},"Amy":{"notes":{}}}}"#,
        );
        let nav = doc.nav();
        assert_eq!(nav.resolve_initial("Zed"), "Zed");
        // A known prefix keeps the full selection
        assert_eq!(nav.resolve_initial("Amy.notes.gone"), "Amy.notes.gone");
        assert_eq!(nav.resolve_initial("Nobody.notes"), "Amy");
        assert_eq!(nav.resolve_initial(""), "Amy");
    }

    #[test]
    fn test_outline() {
        let doc = parse(
            r#"{"timeStamp":"Fri Jul 30 21:25:10 BST 2021","groups":{"UserA":{"notes":{"note":"hi"}}}}"#,
        );
        assert_eq!(doc.nav().outline(), "UserA\n  notes\n");
    }
}
