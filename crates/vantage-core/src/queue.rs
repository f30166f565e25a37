//! The pending-queue contract between the controller and the worker.

use crate::id::NodeId;
use crate::sync::Latch;
use std::sync::Arc;

/// One queued registration request for a single tree node.
///
/// At most one live job exists per node; duplicates are rejected upstream by
/// the registry idempotency check, not by the queue.
#[derive(Debug, Clone)]
pub struct RegistrationJob {
    /// The node to register.
    pub node: NodeId,
    /// Whether the submitter blocks on `done` until the job is processed.
    pub wait: bool,
    /// Released exactly once, after the registration attempt finished
    /// (successfully or not).
    pub done: Arc<Latch>,
}

impl RegistrationJob {
    /// A fire-and-forget job for an explicitly added node.
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            wait: false,
            done: Arc::new(Latch::new()),
        }
    }

    /// A job whose submitter will block until it has been processed.
    pub fn awaited(node: NodeId) -> Self {
        Self {
            node,
            wait: true,
            done: Arc::new(Latch::new()),
        }
    }
}

/// Blocking, order-preserving queue of registration jobs.
///
/// Implementations must be safe for arbitrary producer threads plus the one
/// consumer (the worker).
pub trait JobQueue: Send + Sync {
    /// Append a job to the tail.
    fn add(&self, job: RegistrationJob);

    /// Remove and return the head job, blocking while the queue is empty.
    ///
    /// Returns `None` only after [`close`](JobQueue::close) has been called
    /// and every remaining job has been drained.
    fn take(&self) -> Option<RegistrationJob>;

    /// Momentary emptiness check (the `peek` of the drain protocol).
    fn is_empty(&self) -> bool;

    /// Momentary queue depth.
    fn len(&self) -> usize;

    /// Close the queue, waking blocked takers. Idempotent.
    fn close(&self);
}
