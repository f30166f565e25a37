//! Shared value types for the registration pipeline.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural category derived from a node's declared kind.
///
/// Kinds are external vocabulary (e.g. `server`, `datasource`); the pipeline
/// only threads them through to the registry and the name policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKind(String);

impl NodeKind {
    /// Create a kind from its external label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The external label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Old or new value carried by a change record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeValue {
    /// A reference to a tree node (structural change).
    Node(NodeId),
    /// A plain attribute value.
    Scalar(String),
}

impl ChangeValue {
    /// The node reference, if this value is structural.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            Self::Scalar(_) => None,
        }
    }

    /// The scalar text, if this value is an attribute.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Node(_) => None,
            Self::Scalar(s) => Some(s.as_str()),
        }
    }
}

/// One raw change delivered by the configuration layer after a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// The node the change originated from.
    pub source: NodeId,
    /// The field that changed on `source`.
    pub field: String,
    /// Value before the transaction, absent for additions.
    pub old: Option<ChangeValue>,
    /// Value after the transaction, absent for removals.
    pub new: Option<ChangeValue>,
}

impl ChangeRecord {
    /// A structural addition: `new` references a freshly created node.
    pub fn added(source: NodeId, field: impl Into<String>, node: NodeId) -> Self {
        Self {
            source,
            field: field.into(),
            old: None,
            new: Some(ChangeValue::Node(node)),
        }
    }

    /// A structural removal: `old` references the node that went away.
    pub fn removed(source: NodeId, field: impl Into<String>, node: NodeId) -> Self {
        Self {
            source,
            field: field.into(),
            old: Some(ChangeValue::Node(node)),
            new: None,
        }
    }

    /// An in-place attribute update on `source`.
    pub fn updated(
        source: NodeId,
        field: impl Into<String>,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Self {
        Self {
            source,
            field: field.into(),
            old: old.map(|s| ChangeValue::Scalar(s.to_string())),
            new: new.map(|s| ChangeValue::Scalar(s.to_string())),
        }
    }
}

/// An attribute change already tied to a tracked node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrChange {
    pub node: NodeId,
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl AttrChange {
    /// Whether the change actually alters the value.
    pub fn is_effective(&self) -> bool {
        self.old != self.new
    }
}
