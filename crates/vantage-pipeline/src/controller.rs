//! Orchestrates batch classification, queueing, and lifecycle.

use crate::engine::RegistrationEngine;
use crate::registry::NodeRegistry;
use crate::sorter::ChangeBatchSorter;
use crate::worker::Worker;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vantage_core::{
    AttrChange, ChangeRecord, ConfigTree, Handle, JobQueue, ManagementRegistry, NodeId, NodeKind,
    PipelineConfig, ProxyFactory, ReadinessGate, RegistrationJob, Result, VantageError,
};

/// Entry point of the registration pipeline.
///
/// Committing threads call [`on_change_batch_committed`]; the worker thread
/// owned here performs the actual registrations. All collaborators are
/// injected; the composition root that starts the server decides their
/// lifetime.
///
/// [`on_change_batch_committed`]: PipelineController::on_change_batch_committed
pub struct PipelineController {
    config: PipelineConfig,
    sorter: ChangeBatchSorter,
    engine: Arc<RegistrationEngine>,
    nodes: Arc<NodeRegistry>,
    queue: Arc<dyn JobQueue>,
    worker: Worker,
    gate: Arc<dyn ReadinessGate>,
    root: NodeId,
}

impl PipelineController {
    pub fn new(
        config: PipelineConfig,
        tree: Arc<dyn ConfigTree>,
        registry: Arc<dyn ManagementRegistry>,
        proxies: Arc<dyn ProxyFactory>,
        gate: Arc<dyn ReadinessGate>,
        queue: Arc<dyn JobQueue>,
        root: NodeId,
    ) -> Self {
        let nodes = Arc::new(NodeRegistry::new());
        let engine = Arc::new(RegistrationEngine::new(
            tree.clone(),
            registry,
            proxies,
            nodes.clone(),
            config.synthetic_name_prefix.clone(),
        ));

        Self {
            config,
            sorter: ChangeBatchSorter::new(tree),
            engine,
            nodes,
            queue: queue.clone(),
            worker: Worker::new(queue),
            gate,
            root,
        }
    }

    /// The live node registry, for lookups by embedding code.
    pub fn node_registry(&self) -> &Arc<NodeRegistry> {
        &self.nodes
    }

    /// Process one committed change batch.
    ///
    /// Structural work (removes, adds, and the synchronous waits of the
    /// anomaly path) completes before any attribute change is dispatched, so
    /// an attribute change never targets a node that is concurrently being
    /// bound for the first time.
    pub fn on_change_batch_committed(&self, batch: &[ChangeRecord]) {
        let sorted = self.sorter.sort(batch, &self.nodes);

        // Removes are applied immediately and synchronously; deferring them
        // would leave dangling handles in the external view.
        for node in &sorted.removes {
            self.engine.unregister(*node);
        }

        for node in &sorted.adds {
            // An add for a node that is already bound carries no new work;
            // the registration would be a no-op anyway.
            if self.nodes.is_registered(*node) {
                debug!(node = %node, "Skipping add for already registered node");
                continue;
            }
            self.queue.add(RegistrationJob::new(*node));
        }

        // Implicit adds carry a completion signal: the attribute change that
        // follows in program order needs the node to exist first.
        let mut pending_waits = Vec::with_capacity(sorted.implicit_adds.len());
        for node in &sorted.implicit_adds {
            let job = RegistrationJob::awaited(*node);
            pending_waits.push(job.done.clone());
            self.queue.add(job);
        }

        let depth = self.queue.len();
        if depth > self.config.queue_warn_depth {
            warn!(depth, "Pending registration queue is unusually deep");
        }

        for done in pending_waits {
            done.wait();
        }

        for change in &sorted.changes {
            self.dispatch_attribute_change(change);
        }
    }

    fn dispatch_attribute_change(&self, change: &AttrChange) {
        match self.nodes.proxy_of(change.node) {
            Some(proxy) => {
                if change.is_effective() {
                    proxy.attribute_changed(
                        &change.field,
                        change.old.as_deref(),
                        change.new.as_deref(),
                    );
                }
            }
            None => {
                // The queued registration may have failed or raced; register
                // on demand so the change is never applied to an untracked
                // node.
                warn!(
                    node = %change.node,
                    field = %change.field,
                    "Attribute change for unregistered node; registering on demand"
                );
                match self.engine.register_with_ancestors(change.node) {
                    Ok(_) => {
                        if let Some(proxy) = self.nodes.proxy_of(change.node) {
                            proxy.attribute_changed(
                                &change.field,
                                change.old.as_deref(),
                                change.new.as_deref(),
                            );
                        }
                    }
                    Err(e) => warn!(
                        node = %change.node,
                        cause = %e,
                        "On-demand registration failed; attribute change skipped"
                    ),
                }
            }
        }
    }

    /// Start the pipeline and block until it is ready.
    ///
    /// Waits for the external readiness gate, then for the initial backlog
    /// to drain, then resolves the pre-designated root node's handle. The
    /// root missing at that point is a fatal startup error.
    pub fn start(&self) -> Result<Handle> {
        self.worker
            .start(self.engine.clone(), &self.config.worker_thread_name)?;

        self.gate.await_ready();

        if !self
            .worker
            .initial_drain()
            .wait_timeout(self.config.startup_timeout())
        {
            return Err(VantageError::startup(
                "initial registration backlog was not drained within the startup timeout",
            ));
        }

        let handle = self.nodes.handle_of(self.root).ok_or_else(|| {
            VantageError::startup("root node is not registered after the initial drain")
        })?;

        self.gate.publish_ready(handle.clone());
        info!(root = %handle, "Registration pipeline started");
        Ok(handle)
    }

    /// Stop the pipeline. Idempotent; in-flight registrations complete.
    pub fn stop(&self) {
        self.gate.retract();
        self.worker.stop();
        info!("Registration pipeline stopped");
    }

    /// Pre-warm cached metadata for a node kind. Optional, non-blocking.
    pub fn register_kind(&self, kind: &NodeKind) {
        self.engine.register_kind(kind);
    }
}
