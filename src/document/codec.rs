//! Parsing and serialization of the document text
//!
//! The text form is JSON. Object member order is preserved in both
//! directions and output uses a 4-space indent.

use indexmap::IndexMap;
use serde_json::json;

use crate::error::{KeepsakeError, KeepsakeResult};
use crate::navigation::NavIndex;
use crate::storage::file_io::to_pretty_json;

use super::node::{Node, NodeId, Value};
use super::{timestamp, Document, GROUPS_KEY, TIMESTAMP_KEY};

/// Largest magnitude written as an integer literal
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Document {
    /// Parse document text and validate the root shape
    pub fn parse(bytes: &[u8]) -> KeepsakeResult<Self> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_json(json)
    }

    /// Build a document from an already-parsed JSON value
    pub fn from_json(json: serde_json::Value) -> KeepsakeResult<Self> {
        validate_root(&json)?;

        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            groups: NodeId(0),
            nav: NavIndex::default(),
        };
        doc.root = doc.build(None, String::new(), json);
        doc.groups = doc
            .child(doc.root, GROUPS_KEY)
            .ok_or_else(|| KeepsakeError::MissingField(GROUPS_KEY.to_string()))?;
        doc.rebuild_nav();

        tracing::debug!(nodes = doc.nodes.len(), users = doc.users().len(), "parsed document");
        Ok(doc)
    }

    /// The minimal default document with a single `Empty` user
    pub fn bootstrap() -> Self {
        let json = json!({
            "timeStamp": timestamp::now_unix_date(),
            "groups": { "Empty": {} },
        });
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            groups: NodeId(0),
            nav: NavIndex::default(),
        };
        doc.root = doc.build(None, String::new(), json);
        doc.groups = doc.child(doc.root, GROUPS_KEY).unwrap_or(doc.root);
        doc.rebuild_nav();
        doc
    }

    /// Serialize the whole document, pretty-printed with a 4-space indent
    pub fn serialize(&self) -> KeepsakeResult<Vec<u8>> {
        to_pretty_json(&self.to_json(self.root)?)
    }

    /// Allocate a subtree from a JSON value and return its handle
    pub(crate) fn build(
        &mut self,
        parent: Option<NodeId>,
        name: String,
        json: serde_json::Value,
    ) -> NodeId {
        let node = Node {
            parent,
            name,
            value: Value::Null,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };

        let value = match json {
            serde_json::Value::Object(members) => {
                let mut children = IndexMap::with_capacity(members.len());
                for (key, member) in members {
                    let child = self.build(Some(id), key.clone(), member);
                    children.insert(key, child);
                }
                Value::Object(children)
            }
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| self.build(Some(id), index.to_string(), item))
                    .collect(),
            ),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Null => Value::Null,
        };

        if let Some(node) = self.node_mut(id) {
            node.value = value;
        }
        id
    }

    /// Convert a subtree back into a JSON value
    pub(crate) fn to_json(&self, id: NodeId) -> KeepsakeResult<serde_json::Value> {
        let value = self
            .value(id)
            .ok_or_else(|| KeepsakeError::NotFound(format!("node #{}", id.0)))?;

        Ok(match value {
            Value::Object(children) => {
                let mut members = serde_json::Map::with_capacity(children.len());
                for (key, child) in children {
                    members.insert(key.clone(), self.to_json(*child)?);
                }
                serde_json::Value::Object(members)
            }
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| self.to_json(*item))
                    .collect::<KeepsakeResult<Vec<_>>>()?,
            ),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => number_to_json(*n).ok_or_else(|| {
                KeepsakeError::InvalidDocument(format!(
                    "number at '{}' is not finite",
                    self.path_of(id).unwrap_or_default()
                ))
            })?,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
        })
    }
}

fn number_to_json(n: f64) -> Option<serde_json::Value> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        return Some(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(serde_json::Value::Number)
}

fn validate_root(json: &serde_json::Value) -> KeepsakeResult<()> {
    let root = json.as_object().ok_or_else(|| KeepsakeError::TypeMismatch {
        name: "<root>".to_string(),
        expected: "object",
    })?;

    let stamp = root
        .get(TIMESTAMP_KEY)
        .ok_or_else(|| KeepsakeError::MissingField(TIMESTAMP_KEY.to_string()))?;
    let stamp = stamp.as_str().ok_or_else(|| KeepsakeError::TypeMismatch {
        name: TIMESTAMP_KEY.to_string(),
        expected: "string",
    })?;
    if timestamp::parse_unix_date(stamp).is_none() {
        return Err(KeepsakeError::TypeMismatch {
            name: TIMESTAMP_KEY.to_string(),
            expected: "Unix date timestamp",
        });
    }

    let groups = root
        .get(GROUPS_KEY)
        .ok_or_else(|| KeepsakeError::MissingField(GROUPS_KEY.to_string()))?;
    let users = groups.as_object().ok_or_else(|| KeepsakeError::TypeMismatch {
        name: GROUPS_KEY.to_string(),
        expected: "object",
    })?;

    for (name, user) in users {
        if !user.is_object() {
            return Err(KeepsakeError::TypeMismatch {
                name: name.clone(),
                expected: "object",
            });
        }
    }

    Ok(())
}
