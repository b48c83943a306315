//! Node types for the document arena
//!
//! Nodes never own each other directly. Containers hold [`NodeId`] handles
//! into the owning [`super::Document`], and every node records its parent
//! handle and its name within that parent.

use std::fmt;

use indexmap::IndexMap;

/// Handle to a node inside a [`super::Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// The six value variants a node can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl NodeKind {
    /// Leaves are every kind except objects and arrays
    pub fn is_leaf(self) -> bool {
        !matches!(self, Self::Object | Self::Array)
    }

    /// Lowercase name used in error messages
    pub fn name(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value stored at a node
///
/// Object children keep insertion order for serialization; display order is
/// computed on demand by sorting keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Object(IndexMap<String, NodeId>),
    Array(Vec<NodeId>),
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Value {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
            Self::String(_) => NodeKind::String,
            Self::Number(_) => NodeKind::Number,
            Self::Bool(_) => NodeKind::Bool,
            Self::Null => NodeKind::Null,
        }
    }
}

/// Editor rendering hint carried as a key prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Annotation {
    /// No prefix
    #[default]
    SingleLine,
    /// `ml!`
    MultiLine,
    /// `rt!`
    RichText,
    /// `po!`
    Positional,
}

impl Annotation {
    /// The persisted key prefix for this annotation
    pub fn prefix(self) -> &'static str {
        match self {
            Self::SingleLine => "",
            Self::MultiLine => "ml!",
            Self::RichText => "rt!",
            Self::Positional => "po!",
        }
    }

    /// Split an annotated key into its annotation and bare name
    pub fn split_key(key: &str) -> (Self, &str) {
        for annotation in [Self::MultiLine, Self::RichText, Self::Positional] {
            if let Some(bare) = key.strip_prefix(annotation.prefix()) {
                return (annotation, bare);
            }
        }
        (Self::SingleLine, key)
    }

    /// Strip any annotation prefix from a key
    pub fn bare_name(key: &str) -> &str {
        Self::split_key(key).1
    }
}

/// One arena slot
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    /// Object key, stringified array index, or empty for the root
    pub(crate) name: String,
    pub(crate) value: Value,
}

/// Render a number the way the serializer writes it
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_key() {
        assert_eq!(Annotation::split_key("ml!notes"), (Annotation::MultiLine, "notes"));
        assert_eq!(Annotation::split_key("rt!body"), (Annotation::RichText, "body"));
        assert_eq!(Annotation::split_key("po!pin"), (Annotation::Positional, "pin"));
        assert_eq!(Annotation::split_key("plain"), (Annotation::SingleLine, "plain"));
        // Only the three known tags are meaningful
        assert_eq!(Annotation::split_key("xx!odd"), (Annotation::SingleLine, "xx!odd"));
        assert_eq!(Annotation::split_key("ML!upper"), (Annotation::SingleLine, "ML!upper"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-5.0), "-5");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1), "0.1");
    }

    #[test]
    fn test_leaf_kinds() {
        assert!(NodeKind::String.is_leaf());
        assert!(NodeKind::Null.is_leaf());
        assert!(!NodeKind::Object.is_leaf());
        assert!(!NodeKind::Array.is_leaf());
        assert_eq!(NodeKind::Number.to_string(), "number");
    }
}
