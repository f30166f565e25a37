//! Naming policy for externally visible identifiers.
//!
//! A node's name comes from its `name` field when present, falling back to a
//! single `name` child, and is synthesized from a monotonic counter when both
//! are absent or empty. Characters reserved by the registry's addressing
//! syntax are quoted before the name is used in a bind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vantage_core::{ConfigTree, NodeId};

/// Field consulted first for a node's name hint.
const NAME_FIELD: &str = "name";

/// Characters reserved by the registry addressing syntax.
const RESERVED: &[char] = &[':', '=', ',', '*', '?', '"', '\n'];

/// Allocates externally visible names for nodes.
pub struct NameAllocator {
    tree: Arc<dyn ConfigTree>,
    synthetic_prefix: String,
    counter: AtomicU64,
}

impl NameAllocator {
    pub fn new(tree: Arc<dyn ConfigTree>, synthetic_prefix: impl Into<String>) -> Self {
        Self {
            tree,
            synthetic_prefix: synthetic_prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Resolve the escaped, externally visible name for `node`.
    ///
    /// Synthesized names are unique among themselves by construction; hinted
    /// names rely on the registry's collision detection at bind time.
    pub fn name_for(&self, node: NodeId) -> String {
        let hint = self
            .tree
            .raw_field(node, NAME_FIELD)
            .or_else(|| self.tree.single_child_of_kind(node, NAME_FIELD))
            .filter(|hint| !hint.trim().is_empty());

        match hint {
            Some(hint) => quote_reserved(hint.trim()),
            None => {
                let n = self.counter.fetch_add(1, Ordering::Relaxed);
                format!("{}{}", self.synthetic_prefix, n)
            }
        }
    }
}

/// Quote characters the registry's addressing syntax reserves.
///
/// A name containing any reserved character is wrapped in double quotes with
/// inner quotes and newlines backslash-escaped, mirroring quoting rules of
/// hierarchical object-name syntaxes.
pub fn quote_reserved(name: &str) -> String {
    if !name.contains(RESERVED) {
        return name.to_string();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
