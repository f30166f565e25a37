//! Bidirectional map between tree nodes and their management handles.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vantage_core::{Handle, NodeId, NodeProxy};

/// One registered node: its handle, its proxy, and its bind sequence number.
#[derive(Clone)]
pub struct RegistryEntry {
    pub handle: Handle,
    pub proxy: Arc<dyn NodeProxy>,
    /// Monotonic bind order; a child's sequence is always greater than its
    /// parent's.
    pub seq: u64,
}

#[derive(Default)]
struct Maps {
    by_node: HashMap<NodeId, RegistryEntry>,
    by_handle: HashMap<Handle, NodeId>,
}

/// Concurrent bidirectional registry of bound nodes.
///
/// Both directions are mutated inside one critical section: a reader never
/// observes a handle present in one map and absent from the other.
#[derive(Default)]
pub struct NodeRegistry {
    maps: RwLock<Maps>,
    next_seq: AtomicU64,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically insert a node in both directions.
    ///
    /// Returns `false` without modifying anything if the node already has an
    /// entry; this is the compare-and-set that prevents double binds when two
    /// registrations converge on a shared ancestor.
    pub fn add(&self, node: NodeId, handle: Handle, proxy: Arc<dyn NodeProxy>) -> bool {
        let mut maps = self.maps.write();
        if maps.by_node.contains_key(&node) {
            return false;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        maps.by_handle.insert(handle.clone(), node);
        maps.by_node.insert(node, RegistryEntry { handle, proxy, seq });
        true
    }

    /// Atomically remove the entry for `handle`, if any.
    pub fn remove(&self, handle: &Handle) -> Option<NodeId> {
        let mut maps = self.maps.write();
        let node = maps.by_handle.remove(handle)?;
        maps.by_node.remove(&node);
        Some(node)
    }

    /// Remove `root` and every entry whose handle lies under it.
    ///
    /// Returns the removed nodes. Used after the external registry performed
    /// its (by-convention recursive) unbind, so the local view drops the same
    /// subtree in one critical section.
    pub fn remove_subtree(&self, root: &Handle) -> Vec<NodeId> {
        let mut maps = self.maps.write();
        let doomed: Vec<(NodeId, Handle)> = maps
            .by_node
            .iter()
            .filter(|(_, entry)| entry.handle.is_under(root))
            .map(|(node, entry)| (*node, entry.handle.clone()))
            .collect();

        for (node, handle) in &doomed {
            maps.by_node.remove(node);
            maps.by_handle.remove(handle);
        }

        doomed.into_iter().map(|(node, _)| node).collect()
    }

    /// The handle bound for `node`, if registered.
    pub fn handle_of(&self, node: NodeId) -> Option<Handle> {
        self.maps.read().by_node.get(&node).map(|e| e.handle.clone())
    }

    /// The node bound under `handle`, if any.
    pub fn node_of(&self, handle: &Handle) -> Option<NodeId> {
        self.maps.read().by_handle.get(handle).copied()
    }

    /// The proxy created for `node` at bind time, if registered.
    pub fn proxy_of(&self, node: NodeId) -> Option<Arc<dyn NodeProxy>> {
        self.maps.read().by_node.get(&node).map(|e| e.proxy.clone())
    }

    /// The bind sequence number for `node`, if registered.
    pub fn bound_seq(&self, node: NodeId) -> Option<u64> {
        self.maps.read().by_node.get(&node).map(|e| e.seq)
    }

    /// Whether `node` currently has an entry.
    pub fn is_registered(&self, node: NodeId) -> bool {
        self.maps.read().by_node.contains_key(&node)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.maps.read().by_node.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.maps.read().by_node.is_empty()
    }
}
