//! Core types and collaborator contracts for the Vantage management-view
//! pipeline.
//!
//! Vantage keeps a live management view (a tree of externally addressable
//! handles) synchronized with an in-memory configuration tree mutated
//! transactionally by concurrent actors. This crate is the foundation layer:
//! identities, the error type, shared value types, the traits behind which
//! the configuration tree / management registry / readiness gate live, the
//! single-use latch, the pending-queue contract, and configuration.
//!
//! The pipeline machinery itself (sorter, engine, registry, worker,
//! controller) lives in `vantage-pipeline`.

pub mod config;
pub mod error;
pub mod handle;
pub mod id;
pub mod queue;
pub mod sync;
pub mod traits;
pub mod types;

// Re-export main types
pub use config::PipelineConfig;
pub use error::{Result, VantageError};
pub use handle::Handle;
pub use id::NodeId;
pub use queue::{JobQueue, RegistrationJob};
pub use sync::Latch;
pub use traits::{ConfigTree, ManagementRegistry, NodeProxy, ProxyFactory, ReadinessGate};
pub use types::{AttrChange, ChangeRecord, ChangeValue, NodeKind};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::error::{Result, VantageError};
    pub use crate::handle::Handle;
    pub use crate::id::NodeId;
    pub use crate::queue::{JobQueue, RegistrationJob};
    pub use crate::sync::Latch;
    pub use crate::traits::{
        ConfigTree, ManagementRegistry, NodeProxy, ProxyFactory, ReadinessGate,
    };
    pub use crate::types::{AttrChange, ChangeRecord, ChangeValue, NodeKind};
}
