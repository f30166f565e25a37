//! Dependency-ordered registration against the management registry.
//!
//! The engine guarantees parent-first ordering by construction: a node's
//! handle is only ever produced after its parent's handle exists in the node
//! registry. Recursion terminates at the tree root, which binds directly
//! under the registry's well-known root handle.

use crate::name::{quote_reserved, NameAllocator};
use crate::registry::NodeRegistry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};
use vantage_core::{
    ConfigTree, Handle, ManagementRegistry, NodeId, NodeKind, ProxyFactory, Result, VantageError,
};

/// Cached per-kind data, pre-warmed via [`RegistrationEngine::register_kind`]
/// or lazily on first bind of that kind.
#[derive(Clone)]
struct KindMetadata {
    /// Kind label escaped for the registry addressing syntax.
    escaped_label: String,
}

/// Registers nodes (and, transitively, their unregistered ancestors) against
/// the external management registry.
pub struct RegistrationEngine {
    tree: Arc<dyn ConfigTree>,
    registry: Arc<dyn ManagementRegistry>,
    proxies: Arc<dyn ProxyFactory>,
    nodes: Arc<NodeRegistry>,
    names: NameAllocator,
    kinds: DashMap<NodeKind, KindMetadata>,
    // Serializes top-level registrations: two callers converging on a shared
    // unregistered ancestor must produce exactly one bind per node. Entry
    // only; the recursive walk runs under one acquisition.
    bind_lock: Mutex<()>,
}

impl RegistrationEngine {
    pub fn new(
        tree: Arc<dyn ConfigTree>,
        registry: Arc<dyn ManagementRegistry>,
        proxies: Arc<dyn ProxyFactory>,
        nodes: Arc<NodeRegistry>,
        synthetic_name_prefix: impl Into<String>,
    ) -> Self {
        let names = NameAllocator::new(tree.clone(), synthetic_name_prefix);
        Self {
            tree,
            registry,
            proxies,
            nodes,
            names,
            kinds: DashMap::new(),
            bind_lock: Mutex::new(()),
        }
    }

    /// Ensure `node` and every ancestor above it are registered; return the
    /// node's handle.
    ///
    /// Idempotent: an already registered node returns its existing handle
    /// without touching the external registry.
    pub fn register_with_ancestors(&self, node: NodeId) -> Result<Handle> {
        if let Some(handle) = self.nodes.handle_of(node) {
            return Ok(handle);
        }

        let _guard = self.bind_lock.lock();
        self.register_chain(node)
    }

    fn register_chain(&self, node: NodeId) -> Result<Handle> {
        // Re-check under the lock: another caller may have bound this node
        // (or a shared ancestor) while we waited.
        if let Some(handle) = self.nodes.handle_of(node) {
            return Ok(handle);
        }

        let parent_handle = match self.tree.parent(node) {
            Some(parent) => self.register_chain(parent)?,
            None => self.registry.root_handle(),
        };

        let kind = self.tree.kind(node).ok_or_else(|| {
            VantageError::registration("unknown", node.to_string(), "node has no declared kind")
        })?;
        let escaped_kind = self.warm_kind(&kind);
        let name = self.names.name_for(node);

        let handle = self
            .registry
            .bind(&parent_handle, &NodeKind::new(escaped_kind), &name)
            .map_err(|e| {
                warn!(
                    kind = %kind,
                    name = %name,
                    cause = %e,
                    "Bind rejected by management registry; node stays unregistered"
                );
                VantageError::registration(kind.as_str(), &name, e.to_string())
            })?;

        // Proxy creation happens exactly once, after a successful bind.
        let proxy = self.proxies.create(node, &handle);

        if !self.nodes.add(node, handle.clone(), proxy) {
            // Lost the insert race; the existing entry wins.
            if let Some(existing) = self.nodes.handle_of(node) {
                return Ok(existing);
            }
        }

        debug!(node = %node, handle = %handle, "Registered node");
        Ok(handle)
    }

    /// Unregister `node` and every registered descendant.
    ///
    /// A node that was never registered is a no-op: a remove can legitimately
    /// race ahead of (or entirely skip) a registration that never got
    /// scheduled.
    pub fn unregister(&self, node: NodeId) {
        let Some(handle) = self.nodes.handle_of(node) else {
            debug!(node = %node, "Remove for a node that was never registered; ignoring");
            return;
        };

        // The registry unbinds the whole subtree by convention; mirror that
        // in the local view regardless of the unbind outcome so no stale
        // handle is ever served.
        if let Err(e) = self.registry.unbind(&handle) {
            warn!(handle = %handle, cause = %e, "Unbind failed; dropping local entries anyway");
        }

        let removed = self.nodes.remove_subtree(&handle);
        debug!(
            handle = %handle,
            count = removed.len(),
            "Unregistered node subtree"
        );
    }

    /// Pre-warm cached metadata for a node kind so later binds are cheaper.
    /// Non-blocking and optional.
    pub fn register_kind(&self, kind: &NodeKind) {
        self.warm_kind(kind);
    }

    fn warm_kind(&self, kind: &NodeKind) -> String {
        self.kinds
            .entry(kind.clone())
            .or_insert_with(|| KindMetadata {
                escaped_label: quote_reserved(kind.as_str()),
            })
            .escaped_label
            .clone()
    }
}
