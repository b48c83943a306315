//! The secrets document
//!
//! A single timestamped tree rooted at an object with `timeStamp` and
//! `groups` members. Users live under `groups`; every user-visible path is
//! relative to that node, so `UserA.notes.note` addresses
//! `groups.UserA.notes.note`.
//!
//! Nodes are stored in an arena and addressed by [`NodeId`]. Slots freed by
//! a removal are reused by later additions, so an id is only meaningful
//! until the next structural change. The navigation index is owned by the
//! document and rebuilt after every structural change.

mod codec;
mod edit;
pub mod node;
pub mod timestamp;

pub use edit::{HINT_FIELDS, NOTES_KEY, PW_HINTS_KEY};
pub use node::{format_number, Annotation, NodeId, NodeKind, Value};

use crate::error::{KeepsakeError, KeepsakeResult};
use crate::navigation::NavIndex;

use node::Node;

/// Root member holding the save timestamp
pub const TIMESTAMP_KEY: &str = "timeStamp";

/// Root member holding the users
pub const GROUPS_KEY: &str = "groups";

/// Separator between path segments
pub const PATH_SEPARATOR: char = '.';

/// An in-memory secrets document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: NodeId,
    groups: NodeId,
    nav: NavIndex,
}

impl Document {
    /// The document root object
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `groups` object; path `""` resolves here
    pub fn groups(&self) -> NodeId {
        self.groups
    }

    /// The navigation index for the current structure
    pub fn nav(&self) -> &NavIndex {
        &self.nav
    }

    pub(crate) fn rebuild_nav(&mut self) {
        self.nav = NavIndex::build(self);
        tracing::debug!(entries = self.nav.len(), "rebuilt navigation index");
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// The value stored at a node
    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.node(id).map(|n| &n.value)
    }

    /// The kind of a node
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.value(id).map(Value::kind)
    }

    /// The raw, possibly annotated, key of a node within its parent
    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    /// The annotation and bare name of a node's key
    pub fn annotation(&self, id: NodeId) -> Option<(Annotation, &str)> {
        self.key(id).map(Annotation::split_key)
    }

    /// The parent of a node, `None` for the root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Look up a direct child by key (or index, for arrays)
    pub fn child(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.value(id)? {
            Value::Object(map) => map.get(key).copied(),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).copied()),
            _ => None,
        }
    }

    /// Children in stored order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.value(id) {
            Some(Value::Object(map)) => map.values().copied().collect(),
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Children in display order: objects sorted by key, arrays by index
    pub fn children_sorted(&self, id: NodeId) -> Vec<NodeId> {
        match self.value(id) {
            Some(Value::Object(map)) => {
                let mut entries: Vec<(&String, &NodeId)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                entries.into_iter().map(|(_, id)| *id).collect()
            }
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Stringified value of a leaf; `None` for objects and arrays
    pub fn leaf_text(&self, id: NodeId) -> Option<String> {
        match self.value(id)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => Some("null".to_string()),
            Value::Object(_) | Value::Array(_) => None,
        }
    }

    /// Resolve a user-visible path to a node
    pub fn find_by_path(&self, path: &str) -> KeepsakeResult<NodeId> {
        let mut current = self.groups;
        if path.is_empty() {
            return Ok(current);
        }
        for segment in path.split(PATH_SEPARATOR) {
            current = self
                .child(current, segment)
                .ok_or_else(|| KeepsakeError::NotFound(path.to_string()))?;
        }
        Ok(current)
    }

    /// The user-visible path of a node, `None` if it is outside `groups`
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = id;
        while current != self.groups {
            let node = self.node(current)?;
            segments.push(node.name.as_str());
            current = node.parent?;
        }
        segments.reverse();
        Some(segments.join("."))
    }

    /// Number of path segments below `groups` (users are depth 1)
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        let mut depth = 0;
        let mut current = id;
        while current != self.groups {
            current = self.parent(current)?;
            depth += 1;
        }
        Some(depth)
    }

    /// User names in display order
    pub fn users(&self) -> Vec<String> {
        self.children_sorted(self.groups)
            .into_iter()
            .filter_map(|id| self.key(id).map(str::to_string))
            .collect()
    }

    /// Copy a subtree out as a detached JSON value
    pub fn snapshot(&self, id: NodeId) -> KeepsakeResult<serde_json::Value> {
        self.to_json(id)
    }

    /// Copy the subtree at a path out as a detached JSON value
    pub fn snapshot_path(&self, path: &str) -> KeepsakeResult<serde_json::Value> {
        let id = self.find_by_path(path)?;
        self.to_json(id)
    }

    /// The parsed `timeStamp` member
    pub fn timestamp(&self) -> Option<chrono::NaiveDateTime> {
        let id = self.child(self.root, TIMESTAMP_KEY)?;
        match self.value(id)? {
            Value::String(text) => timestamp::parse_unix_date(text),
            _ => None,
        }
    }

    /// The raw `timeStamp` text
    pub fn timestamp_text(&self) -> Option<&str> {
        let id = self.child(self.root, TIMESTAMP_KEY)?;
        match self.value(id)? {
            Value::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Set `timeStamp` to the current local time
    pub fn touch_timestamp(&mut self) {
        let now = timestamp::now_unix_date();
        if let Some(id) = self.child(self.root, TIMESTAMP_KEY) {
            if let Some(node) = self.node_mut(id) {
                node.value = Value::String(now);
            }
        }
    }
}
