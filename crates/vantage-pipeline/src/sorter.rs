//! Classifies a committed change batch into structural and attribute work.

use crate::registry::NodeRegistry;
use std::sync::Arc;
use tracing::warn;
use vantage_core::{AttrChange, ChangeRecord, ConfigTree, NodeId};

/// The classified contents of one committed batch.
#[derive(Debug, Default)]
pub struct SortedBatch {
    /// Nodes explicitly added this batch (subtree roots; descendants are
    /// covered by the recursive registration walk, not listed here).
    pub adds: Vec<NodeId>,
    /// Nodes that must be registered before their own attribute change can
    /// be applied: an attribute event arrived for a node that was never the
    /// subject of an add (out-of-order notification anomaly).
    pub implicit_adds: Vec<NodeId>,
    /// Subtree roots removed this batch; to be unregistered immediately.
    pub removes: Vec<NodeId>,
    /// In-place attribute changes, dispatched only after all structural work.
    pub changes: Vec<AttrChange>,
}

/// Two-pass sorter over raw change records.
pub struct ChangeBatchSorter {
    tree: Arc<dyn ConfigTree>,
}

impl ChangeBatchSorter {
    pub fn new(tree: Arc<dyn ConfigTree>) -> Self {
        Self { tree }
    }

    /// Classify `batch` against the current registration state.
    ///
    /// Never fails: anomalous records are recovered (implicit add) or
    /// dropped with a warning.
    pub fn sort(&self, batch: &[ChangeRecord], registry: &NodeRegistry) -> SortedBatch {
        let mut sorted = SortedBatch::default();

        // Pass 1: structural records. An add is old-absent/new-node, a
        // remove is new-absent/old-node.
        for record in batch {
            match (&record.old, &record.new) {
                (None, Some(new)) => {
                    if let Some(node) = new.as_node() {
                        sorted.adds.push(node);
                    }
                }
                (Some(old), None) => {
                    if let Some(node) = old.as_node() {
                        sorted.removes.push(node);
                    }
                }
                _ => {}
            }
        }

        // Pass 2: everything that was not a structural record.
        for record in batch {
            if is_structural(record) {
                continue;
            }

            let source = record.source;

            if sorted.removes.contains(&source) {
                warn!(
                    node = %source,
                    field = %record.field,
                    "Dropping attribute change for node removed in the same batch"
                );
                continue;
            }

            let known = registry.is_registered(source)
                || sorted.adds.contains(&source)
                || sorted.implicit_adds.contains(&source);

            if !known {
                if !self.tree.contains(source) {
                    warn!(
                        node = %source,
                        field = %record.field,
                        "Dropping change record: source cannot be resolved to a tracked node"
                    );
                    continue;
                }

                // Attribute event arrived before the node's own add event.
                // Recoverable: schedule the node for registration first.
                warn!(
                    node = %source,
                    field = %record.field,
                    "Attribute change for unregistered node; scheduling implicit registration"
                );
                sorted.implicit_adds.push(source);
            }

            sorted.changes.push(AttrChange {
                node: source,
                field: record.field.clone(),
                old: record.old.as_ref().and_then(|v| v.as_scalar()).map(String::from),
                new: record.new.as_ref().and_then(|v| v.as_scalar()).map(String::from),
            });
        }

        sorted
    }
}

fn is_structural(record: &ChangeRecord) -> bool {
    matches!(
        (&record.old, &record.new),
        (None, Some(v)) if v.as_node().is_some()
    ) || matches!(
        (&record.old, &record.new),
        (Some(v), None) if v.as_node().is_some()
    )
}
