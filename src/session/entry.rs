//! Edit registry with revert and batch commit

use std::collections::BTreeMap;

use crate::document::{Annotation, Document, NodeId, NodeKind};
use crate::error::{KeepsakeError, KeepsakeResult};

/// A staged edit of one leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEntry {
    /// Path of the leaf in the document
    pub path: String,
    /// Title shown by the editor
    pub title: String,
    /// Leaf type, which decides how text is coerced on commit
    pub kind: NodeKind,
    /// Rendering hint taken from the key prefix
    pub annotation: Annotation,
    /// Text last known to be in the document
    pub old_text: String,
    /// Text staged for the next commit
    pub new_text: String,
}

impl EditEntry {
    /// An entry is dirty when its staged text differs from the document
    pub fn is_dirty(&self) -> bool {
        self.new_text != self.old_text
    }
}

/// Registry of staged edits keyed by path
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    entries: BTreeMap<String, EditEntry>,
}

impl EditSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leaf for editing, or return the existing entry for its path
    pub fn register(
        &mut self,
        doc: &Document,
        node: NodeId,
        path: &str,
        title: &str,
        current_text: &str,
    ) -> KeepsakeResult<&EditEntry> {
        let kind = doc
            .kind(node)
            .ok_or_else(|| KeepsakeError::NotFound(path.to_string()))?;
        let annotation = doc.annotation(node).map(|(a, _)| a).unwrap_or_default();

        Ok(self
            .entries
            .entry(path.to_string())
            .or_insert_with(|| EditEntry {
                path: path.to_string(),
                title: title.to_string(),
                kind,
                annotation,
                old_text: current_text.to_string(),
                new_text: current_text.to_string(),
            }))
    }

    /// Register the leaf at `path` using its current value as the text
    pub fn register_path(&mut self, doc: &Document, path: &str) -> KeepsakeResult<&EditEntry> {
        let node = doc.find_by_path(path)?;
        let text = doc.leaf_text(node).ok_or_else(|| KeepsakeError::TypeMismatch {
            name: path.to_string(),
            expected: "leaf",
        })?;
        let title = doc
            .annotation(node)
            .map(|(_, bare)| bare.to_string())
            .unwrap_or_default();
        self.register(doc, node, path, &title, &text)
    }

    /// Stage new text; returns whether the entry is now dirty
    pub fn set_new(&mut self, path: &str, text: &str) -> KeepsakeResult<bool> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| KeepsakeError::NotFound(path.to_string()))?;
        entry.new_text = text.to_string();
        Ok(entry.is_dirty())
    }

    /// Discard staged text for a path
    pub fn revert(&mut self, path: &str) -> KeepsakeResult<()> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| KeepsakeError::NotFound(path.to_string()))?;
        entry.new_text = entry.old_text.clone();
        Ok(())
    }

    pub fn entry(&self, path: &str) -> Option<&EditEntry> {
        self.entries.get(path)
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.entries.get(path).is_some_and(EditEntry::is_dirty)
    }

    /// Number of entries with staged changes
    pub fn dirty_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_dirty()).count()
    }

    /// Paths of entries with staged changes, in sorted order
    pub fn dirty_paths(&self) -> Vec<&str> {
        self.entries
            .values()
            .filter(|e| e.is_dirty())
            .map(|e| e.path.as_str())
            .collect()
    }

    /// Drop the entry for `path` and every entry below it
    ///
    /// Call after renaming or removing a subtree so stale paths are never
    /// committed.
    pub fn forget(&mut self, path: &str) {
        let nested = format!("{}.", path);
        self.entries
            .retain(|key, _| key != path && !key.starts_with(&nested));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every dirty entry to the document
    ///
    /// Entries that fail to apply stay dirty and do not stop the batch.
    /// Returns the number of entries applied.
    pub fn commit(&mut self, doc: &mut Document) -> usize {
        let mut applied = 0;

        for entry in self.entries.values_mut().filter(|e| e.is_dirty()) {
            match doc.set_leaf(&entry.path, &entry.new_text) {
                Ok(()) => {
                    entry.old_text = entry.new_text.clone();
                    applied += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path, error = %e, "edit not applied");
                }
            }
        }

        if applied > 0 {
            doc.rebuild_nav();
            tracing::info!(applied, "committed edits");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse(
            br#"{"timeStamp":"Fri Jul 30 21:25:10 BST 2021","groups":{"UserA":{"notes":{"note":"hi","ml!long":"a\nb"},"acct":{"limit":5}}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_edit_commit_scenario() {
        let mut doc = sample();
        let mut session = EditSession::new();

        let node = doc.find_by_path("UserA.notes.note").unwrap();
        session
            .register(&doc, node, "UserA.notes.note", "note", "hi")
            .unwrap();
        assert_eq!(session.dirty_count(), 0);

        assert!(session.set_new("UserA.notes.note", "bye").unwrap());
        assert_eq!(session.dirty_count(), 1);

        assert_eq!(session.commit(&mut doc), 1);
        let text = String::from_utf8(doc.serialize().unwrap()).unwrap();
        assert!(text.contains("\"note\": \"bye\""));

        assert_eq!(session.commit(&mut doc), 0);
        assert_eq!(session.dirty_count(), 0);
    }

    #[test]
    fn test_commit_with_nothing_dirty() {
        let mut doc = sample();
        let mut session = EditSession::new();
        assert_eq!(session.commit(&mut doc), 0);

        session.register_path(&doc, "UserA.notes.note").unwrap();
        assert_eq!(session.commit(&mut doc), 0);
    }

    #[test]
    fn test_register_returns_existing_entry() {
        let doc = sample();
        let mut session = EditSession::new();
        session.register_path(&doc, "UserA.notes.note").unwrap();
        session.set_new("UserA.notes.note", "staged").unwrap();

        let node = doc.find_by_path("UserA.notes.note").unwrap();
        let entry = session
            .register(&doc, node, "UserA.notes.note", "other", "hi")
            .unwrap();
        assert_eq!(entry.new_text, "staged");
        assert_eq!(entry.title, "note");
    }

    #[test]
    fn test_entry_metadata() {
        let doc = sample();
        let mut session = EditSession::new();
        let entry = session.register_path(&doc, "UserA.notes.ml!long").unwrap();
        assert_eq!(entry.kind, NodeKind::String);
        assert_eq!(entry.annotation, Annotation::MultiLine);
        assert_eq!(entry.title, "long");

        let entry = session.register_path(&doc, "UserA.acct.limit").unwrap();
        assert_eq!(entry.kind, NodeKind::Number);
        assert_eq!(entry.old_text, "5");

        assert!(session.register_path(&doc, "UserA.acct").is_err());
    }

    #[test]
    fn test_revert() {
        let doc = sample();
        let mut session = EditSession::new();
        session.register_path(&doc, "UserA.notes.note").unwrap();
        session.set_new("UserA.notes.note", "changed").unwrap();
        assert!(session.is_dirty("UserA.notes.note"));

        session.revert("UserA.notes.note").unwrap();
        let entry = session.entry("UserA.notes.note").unwrap();
        assert!(!entry.is_dirty());
        assert_eq!(entry.new_text, entry.old_text);

        assert!(session.revert("UserA.missing").unwrap_err().is_not_found());
        assert!(session.set_new("UserA.missing", "x").is_err());
    }

    #[test]
    fn test_failed_entry_stays_dirty() {
        let mut doc = sample();
        let mut session = EditSession::new();
        session.register_path(&doc, "UserA.acct.limit").unwrap();
        session.register_path(&doc, "UserA.notes.note").unwrap();
        session.set_new("UserA.acct.limit", "lots").unwrap();
        session.set_new("UserA.notes.note", "ok").unwrap();

        assert_eq!(session.commit(&mut doc), 1);
        assert_eq!(session.dirty_paths(), vec!["UserA.acct.limit"]);

        session.set_new("UserA.acct.limit", "7.5").unwrap();
        assert_eq!(session.commit(&mut doc), 1);
        assert_eq!(
            doc.leaf_text(doc.find_by_path("UserA.acct.limit").unwrap()).as_deref(),
            Some("7.5")
        );
    }

    #[test]
    fn test_forget_subtree() {
        let doc = sample();
        let mut session = EditSession::new();
        session.register_path(&doc, "UserA.notes.note").unwrap();
        session.register_path(&doc, "UserA.acct.limit").unwrap();

        session.forget("UserA.notes");
        assert!(session.entry("UserA.notes.note").is_none());
        assert_eq!(session.len(), 1);

        session.forget("UserA");
        assert!(session.is_empty());
    }
}
