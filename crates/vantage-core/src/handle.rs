//! External handle representation, independent of any registry wire format.
//!
//! A [`Handle`] is the hierarchical identifier a management registry assigns
//! to a bound node. The pipeline treats handles as opaque values with exactly
//! two structural facts: every handle descends from a well-known root, and a
//! handle's ancestry is visible as a segment prefix. The prefix relation is
//! what makes recursive subtree unregistration bookkeeping possible.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchical identifier assigned by the management registry.
///
/// Handles are cheap to clone and usable as map keys in both directions of
/// the node registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    domain: String,
    segments: Vec<String>,
}

impl Handle {
    /// Create the well-known root handle for a registry domain.
    pub fn root(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            segments: Vec::new(),
        }
    }

    /// Compose a child handle one level below this one.
    ///
    /// `name` is expected to already be escaped for the registry's addressing
    /// syntax; composition itself performs no quoting.
    pub fn child(&self, kind: &str, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("{}={}", kind, name));
        Self {
            domain: self.domain.clone(),
            segments,
        }
    }

    /// The registry domain this handle belongs to.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Hierarchical prefix test: is `self` equal to or below `ancestor`?
    pub fn is_under(&self, ancestor: &Handle) -> bool {
        if self.domain != ancestor.domain || ancestor.segments.len() > self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(ancestor.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Get the parent handle, if any.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }

        let mut segments = self.segments.clone();
        segments.pop();

        Some(Self {
            domain: self.domain.clone(),
            segments,
        })
    }

    /// Check if this is the root handle of its domain.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/{}", self.domain, self.segments.join("/"))
    }
}
