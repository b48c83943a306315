//! Structural and leaf mutations
//!
//! Every structural change rebuilds the navigation index before returning,
//! so the index always matches the tree.

use serde_json::json;

use crate::error::{KeepsakeError, KeepsakeResult};

use super::node::{NodeId, NodeKind, Value};
use super::{Document, PATH_SEPARATOR};

/// Key of the per-user notes object
pub const NOTES_KEY: &str = "notes";

/// Key of the per-user password hints object
pub const PW_HINTS_KEY: &str = "pwHints";

/// Fields of a password hint, in stored order
pub const HINT_FIELDS: [&str; 5] = ["userId", "pre", "post", "notes", "positional"];

fn default_hint() -> serde_json::Value {
    json!({
        "userId": "",
        "pre": "",
        "post": "",
        "notes": "",
        "positional": "12345",
    })
}

fn validate_name(name: &str) -> KeepsakeResult<()> {
    if name.is_empty() {
        return Err(KeepsakeError::Validation("Name cannot be empty".into()));
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(KeepsakeError::Validation(format!(
            "Name '{}' cannot contain '{}'",
            name, PATH_SEPARATOR
        )));
    }
    Ok(())
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", parent, PATH_SEPARATOR, key)
    }
}

impl Document {
    fn object_members_mut(
        &mut self,
        id: NodeId,
    ) -> Option<&mut indexmap::IndexMap<String, NodeId>> {
        match self.node_mut(id).map(|n| &mut n.value) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    /// Insert a new member into an object, failing on collision
    fn attach(
        &mut self,
        parent: NodeId,
        key: &str,
        json: serde_json::Value,
    ) -> KeepsakeResult<NodeId> {
        let parent_path = self.path_of(parent).unwrap_or_default();
        match self.value(parent) {
            Some(Value::Object(map)) if map.contains_key(key) => {
                return Err(KeepsakeError::duplicate(parent_path, key));
            }
            Some(Value::Object(_)) => {}
            _ => {
                return Err(KeepsakeError::TypeMismatch {
                    name: parent_path,
                    expected: "object",
                })
            }
        }

        let child = self.build(Some(parent), key.to_string(), json);
        if let Some(map) = self.object_members_mut(parent) {
            map.insert(key.to_string(), child);
        }
        Ok(child)
    }

    /// Find or create the named object member of a user
    fn user_section(&mut self, user: &str, section: &str) -> KeepsakeResult<NodeId> {
        let user_id = self
            .child(self.groups, user)
            .ok_or_else(|| KeepsakeError::NotFound(user.to_string()))?;

        match self.child(user_id, section) {
            Some(id) if self.kind(id) == Some(NodeKind::Object) => Ok(id),
            Some(_) => Err(KeepsakeError::TypeMismatch {
                name: join_path(user, section),
                expected: "object",
            }),
            None => self.attach(user_id, section, json!({})),
        }
    }

    /// Add a user seeded with one hint and one note
    pub fn add_user(&mut self, name: &str) -> KeepsakeResult<NodeId> {
        validate_name(name)?;
        let seed = json!({
            "pwHints": { "application": default_hint() },
            "notes": { "note": "" },
        });
        let id = self.attach(self.groups, name, seed)?;
        self.rebuild_nav();
        tracing::info!(user = name, "added user");
        Ok(id)
    }

    /// Add an empty note to a user, creating `notes` if needed
    pub fn add_note(&mut self, user: &str, name: &str) -> KeepsakeResult<NodeId> {
        validate_name(name)?;
        let notes = self.user_section(user, NOTES_KEY)?;
        let result = self.attach(notes, name, json!(""));
        self.rebuild_nav();
        let id = result?;
        tracing::info!(user, note = name, "added note");
        Ok(id)
    }

    /// Add a default password hint to a user, creating `pwHints` if needed
    pub fn add_hint(&mut self, user: &str, app: &str) -> KeepsakeResult<NodeId> {
        validate_name(app)?;
        let hints = self.user_section(user, PW_HINTS_KEY)?;
        let result = self.attach(hints, app, default_hint());
        self.rebuild_nav();
        let id = result?;
        tracing::info!(user, app, "added hint");
        Ok(id)
    }

    /// Rename an object member in place, keeping its position and subtree
    pub fn rename_path(&mut self, path: &str, new_name: &str) -> KeepsakeResult<NodeId> {
        validate_name(new_name)?;
        let id = self.find_by_path(path)?;
        let parent = self
            .parent(id)
            .filter(|_| id != self.groups)
            .ok_or_else(|| KeepsakeError::Validation("Cannot rename the document root".into()))?;
        let parent_path = self.path_of(parent).unwrap_or_default();
        let old_name = self.key(id).unwrap_or_default().to_string();

        if old_name == new_name {
            return Ok(id);
        }

        let map = self
            .object_members_mut(parent)
            .ok_or_else(|| KeepsakeError::TypeMismatch {
                name: path.to_string(),
                expected: "object member",
            })?;
        if map.contains_key(new_name) {
            return Err(KeepsakeError::duplicate(parent_path, new_name));
        }

        if let Some((index, _, child)) = map.shift_remove_full(&old_name) {
            map.insert(new_name.to_string(), child);
            let last = map.len() - 1;
            map.move_index(last, index);
        }
        if let Some(node) = self.node_mut(id) {
            node.name = new_name.to_string();
        }

        self.rebuild_nav();
        tracing::info!(from = path, to = new_name, "renamed node");
        Ok(id)
    }

    /// Remove a node and its subtree
    ///
    /// Fails with `UnderMin` if fewer than `min_remaining` siblings would
    /// be left in the parent.
    pub fn remove_path(&mut self, path: &str, min_remaining: usize) -> KeepsakeResult<()> {
        let id = self.find_by_path(path)?;
        let parent = self
            .parent(id)
            .filter(|_| id != self.groups)
            .ok_or_else(|| KeepsakeError::Validation("Cannot remove the document root".into()))?;
        let parent_path = self.path_of(parent).unwrap_or_default();

        let siblings = self.children(parent).len();
        if siblings.saturating_sub(1) < min_remaining {
            return Err(KeepsakeError::UnderMin {
                parent: parent_path,
                floor: min_remaining,
            });
        }

        let name = self.key(id).unwrap_or_default().to_string();
        let mut renumber = Vec::new();
        match self.node_mut(parent).map(|n| &mut n.value) {
            Some(Value::Object(map)) => {
                map.shift_remove(&name);
            }
            Some(Value::Array(items)) => {
                items.retain(|item| *item != id);
                renumber = items.clone();
            }
            _ => {}
        }
        for (index, item) in renumber.into_iter().enumerate() {
            if let Some(node) = self.node_mut(item) {
                node.name = index.to_string();
            }
        }

        self.free_subtree(id);
        self.rebuild_nav();
        tracing::info!(path, "removed node");
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children = self.children(id);
        if let Some(slot) = self.nodes.get_mut(id.0).filter(|slot| slot.is_some()) {
            *slot = None;
            self.free.push(id);
        }
        for child in children {
            self.free_subtree(child);
        }
    }

    /// Replace a leaf's value from text, coerced to the leaf's current type
    pub fn set_leaf(&mut self, path: &str, text: &str) -> KeepsakeResult<()> {
        let id = self.find_by_path(path)?;
        let kind = self
            .kind(id)
            .ok_or_else(|| KeepsakeError::NotFound(path.to_string()))?;

        let coercion_error = |kind: NodeKind| KeepsakeError::TypeCoercion {
            path: path.to_string(),
            kind: kind.name(),
            text: text.to_string(),
        };

        let value = match kind {
            NodeKind::String => Value::String(text.to_string()),
            NodeKind::Bool => match text {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(coercion_error(kind)),
            },
            NodeKind::Number => match text.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Value::Number(n),
                _ => return Err(coercion_error(kind)),
            },
            NodeKind::Null if text == "null" => Value::Null,
            NodeKind::Null => return Err(coercion_error(kind)),
            NodeKind::Object | NodeKind::Array => {
                return Err(KeepsakeError::TypeMismatch {
                    name: path.to_string(),
                    expected: "leaf",
                })
            }
        };

        if let Some(node) = self.node_mut(id) {
            node.value = value;
        }
        Ok(())
    }
}
