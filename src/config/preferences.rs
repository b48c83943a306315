//! Plaintext preferences document
//!
//! A small JSON document addressed by dotted paths, stored next to the
//! application's other configuration. Reads go through a per-path cache that
//! every write invalidates for the affected paths.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{KeepsakeError, KeepsakeResult};
use crate::storage::file_io::{read_bytes, to_pretty_json, write_bytes_atomic};

/// Result of a preferences lookup
#[derive(Debug, Clone, PartialEq)]
pub enum PrefEntry {
    /// A string, number or bool, rendered as text
    Text(String),
    /// An object or array
    Node(Value),
}

impl PrefEntry {
    /// The text of a leaf entry
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Node(_) => None,
        }
    }
}

/// Dotted-path keyed preferences backed by a JSON file
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    root: Value,
    cache: RefCell<HashMap<String, PrefEntry>>,
}

impl Preferences {
    /// Empty preferences that will be saved to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: Value::Object(Map::new()),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Load preferences from disk; a missing file gives an empty document
    pub fn load(path: impl Into<PathBuf>) -> KeepsakeResult<Self> {
        let path = path.into();
        let mut prefs = Self::new(path.clone());

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no preferences file, starting empty");
            return Ok(prefs);
        }

        let bytes = read_bytes(&path)?;
        let root: Value = serde_json::from_slice(&bytes).map_err(|e| {
            KeepsakeError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if !root.is_object() {
            return Err(KeepsakeError::Config(format!(
                "{} does not hold a JSON object",
                path.display()
            )));
        }

        prefs.root = root;
        tracing::debug!(path = %path.display(), "loaded preferences");
        Ok(prefs)
    }

    /// Write preferences to disk atomically
    pub fn save(&self) -> KeepsakeResult<()> {
        let bytes = to_pretty_json(&self.root)?;
        write_bytes_atomic(&self.path, &bytes)?;
        tracing::debug!(path = %self.path.display(), "saved preferences");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole preferences document
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up a dotted path
    ///
    /// Leaves come back as text, objects and arrays as nodes. The empty path
    /// addresses the root. Missing paths and nulls return `None`.
    pub fn get(&self, path: &str) -> Option<PrefEntry> {
        let path = normalize(path);
        if let Some(hit) = self.cache.borrow().get(&path) {
            return Some(hit.clone());
        }

        let entry = match lookup(&self.root, &path)? {
            Value::String(text) => PrefEntry::Text(text.clone()),
            Value::Number(n) => PrefEntry::Text(n.to_string()),
            Value::Bool(b) => PrefEntry::Text(b.to_string()),
            Value::Null => return None,
            node => PrefEntry::Node(node.clone()),
        };

        self.cache.borrow_mut().insert(path, entry.clone());
        Some(entry)
    }

    /// Text at a dotted path, if the path holds a leaf
    pub fn get_text(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            PrefEntry::Text(text) => Some(text),
            PrefEntry::Node(_) => None,
        }
    }

    /// Set `key` inside the object at `path`, creating missing objects on the way
    ///
    /// Fails when `path` runs into a leaf.
    pub fn put(&mut self, path: &str, key: &str, value: impl Into<Value>) -> KeepsakeResult<()> {
        if key.is_empty() || key.contains('.') {
            return Err(KeepsakeError::Validation(format!(
                "Invalid preference key '{}'",
                key
            )));
        }

        let mut current = &mut self.root;
        let mut walked = String::new();
        for segment in segments(path) {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);

            let members = current
                .as_object_mut()
                .ok_or_else(|| leaf_in_path(&walked))?;
            current = members
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let members = current.as_object_mut().ok_or_else(|| leaf_in_path(path))?;
        members.insert(key.to_string(), value.into());

        self.invalidate(&join(&normalize(path), key));
        Ok(())
    }

    /// Remove the entry at a dotted path; returns whether it existed
    pub fn remove(&mut self, path: &str) -> bool {
        let path = normalize(path);
        let (parent, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (parent, key),
            None => ("", path.as_str()),
        };
        let removed = lookup_mut(&mut self.root, parent)
            .and_then(Value::as_object_mut)
            .and_then(|members| members.shift_remove(key))
            .is_some();

        if removed {
            self.invalidate(&path);
        }
        removed
    }

    /// Drop cached entries that a write at `changed` could affect
    fn invalidate(&self, changed: &str) {
        let below = format!("{}.", changed);
        self.cache.borrow_mut().retain(|cached, _| {
            let is_ancestor = cached.is_empty() || below.starts_with(&format!("{}.", cached));
            let is_descendant = cached.starts_with(&below);
            !(cached == changed || is_ancestor || is_descendant)
        });
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Canonical form of a dotted path, used as the cache key
fn normalize(path: &str) -> String {
    segments(path).collect::<Vec<_>>().join(".")
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn leaf_in_path(path: &str) -> KeepsakeError {
    KeepsakeError::TypeMismatch {
        name: path.to_string(),
        expected: "object",
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn lookup_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    segments(path).try_fold(root, |node, segment| node.as_object_mut()?.get_mut(segment))
}
