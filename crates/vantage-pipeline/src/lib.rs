//! Registration pipeline keeping a live management view in sync with the
//! configuration tree.
//!
//! The pipeline turns the stream of committed change batches into correctly
//! ordered, idempotent registration and deregistration operations against an
//! external management registry:
//!
//! - [`ChangeBatchSorter`]: classifies a batch into adds, removes, and
//!   attribute changes, recovering out-of-order notifications.
//! - [`RegistrationEngine`]: parent-first recursive registration and
//!   subtree unregistration.
//! - [`NodeRegistry`]: concurrent bidirectional node ↔ handle map.
//! - [`Worker`]: the background thread draining the pending queue, with the
//!   initial-backlog handshake startup callers block on.
//! - [`PipelineController`]: routing, lifecycle, and the blocking `start()`.
//!
//! Collaborators (configuration tree, management registry, proxy factory,
//! readiness gate) are trait objects from `vantage-core`, injected at
//! construction.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vantage_core::{PipelineConfig, ChangeRecord, NodeId};
//! use vantage_pipeline::{InMemoryJobQueue, PipelineController};
//!
//! # fn example(
//! #     tree: Arc<dyn vantage_core::ConfigTree>,
//! #     registry: Arc<dyn vantage_core::ManagementRegistry>,
//! #     proxies: Arc<dyn vantage_core::ProxyFactory>,
//! #     gate: Arc<dyn vantage_core::ReadinessGate>,
//! #     root: NodeId,
//! #     batch: Vec<ChangeRecord>,
//! # ) -> vantage_core::Result<()> {
//! let controller = PipelineController::new(
//!     PipelineConfig::default(),
//!     tree,
//!     registry,
//!     proxies,
//!     gate,
//!     Arc::new(InMemoryJobQueue::new()),
//!     root,
//! );
//!
//! controller.on_change_batch_committed(&batch);
//! let root_handle = controller.start()?;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod engine;
pub mod name;
pub mod queue;
pub mod registry;
pub mod sorter;
pub mod worker;

// Re-export main types
pub use controller::PipelineController;
pub use engine::RegistrationEngine;
pub use name::NameAllocator;
pub use queue::InMemoryJobQueue;
pub use registry::{NodeRegistry, RegistryEntry};
pub use sorter::{ChangeBatchSorter, SortedBatch};
pub use worker::Worker;

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::controller::PipelineController;
    pub use crate::engine::RegistrationEngine;
    pub use crate::queue::InMemoryJobQueue;
    pub use crate::registry::NodeRegistry;
    pub use crate::sorter::{ChangeBatchSorter, SortedBatch};
    pub use crate::worker::Worker;
    pub use vantage_core::prelude::*;
}
