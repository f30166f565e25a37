//! Core traits defining the seams to Vantage's external collaborators.
//!
//! The configuration tree, the management registry, and the readiness gate
//! are all owned by the surrounding server. The pipeline consumes them
//! through these traits and is composed from injected `Arc`s, never through
//! process-wide singletons.

use crate::error::Result;
use crate::handle::Handle;
use crate::id::NodeId;
use crate::types::NodeKind;
use std::sync::Arc;

/// Read-only navigation over the external configuration tree.
pub trait ConfigTree: Send + Sync {
    /// The parent of `node`, or `None` for the tree root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// The declared kind of `node`, or `None` if the node is unknown.
    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    /// A raw field value on `node`, used for name-hint resolution.
    fn raw_field(&self, node: NodeId, field: &str) -> Option<String>;

    /// The value of the single child of the given kind, if `node` has
    /// exactly one. Fallback source for name hints.
    fn single_child_of_kind(&self, node: NodeId, kind: &str) -> Option<String>;

    /// Whether `node` currently exists in the tree.
    fn contains(&self, node: NodeId) -> bool;
}

/// The external management registry the pipeline binds nodes into.
pub trait ManagementRegistry: Send + Sync {
    /// Bind a new entry under `parent` and return its handle.
    ///
    /// `name` is already escaped for the registry's addressing syntax.
    fn bind(&self, parent: &Handle, kind: &NodeKind, name: &str) -> Result<Handle>;

    /// Unbind `handle` and, by convention, every currently bound descendant.
    fn unbind(&self, handle: &Handle) -> Result<()>;

    /// The well-known root handle, ultimate ancestor for parentless nodes.
    fn root_handle(&self) -> Handle;
}

/// Implementation-side proxy created for each successfully bound node.
pub trait NodeProxy: Send + Sync {
    /// Propagate an in-place attribute change to the external handle.
    fn attribute_changed(&self, field: &str, old: Option<&str>, new: Option<&str>);
}

/// Creates the proxy object for a node, exactly once per successful bind.
pub trait ProxyFactory: Send + Sync {
    fn create(&self, node: NodeId, handle: &Handle) -> Arc<dyn NodeProxy>;
}

/// Feature-availability primitive the pipeline participates in at startup.
pub trait ReadinessGate: Send + Sync {
    /// Block until the prerequisite feature the pipeline depends on is up.
    fn await_ready(&self);

    /// Publish the pipeline's own availability, carrying the root handle.
    fn publish_ready(&self, root: Handle);

    /// Withdraw the published availability. Idempotent.
    fn retract(&self);
}
