//! Shared fakes for pipeline integration tests.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use vantage_core::{
    ConfigTree, Handle, JobQueue, Latch, ManagementRegistry, NodeId, NodeKind, NodeProxy,
    ProxyFactory, ReadinessGate, RegistrationJob, Result, VantageError,
};
use vantage_pipeline::InMemoryJobQueue;

/// Install a subscriber once so failing tests print their pipeline logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// In-memory configuration tree the tests mutate directly.
#[derive(Default)]
pub struct FakeTree {
    parents: DashMap<NodeId, NodeId>,
    kinds: DashMap<NodeId, NodeKind>,
    names: DashMap<NodeId, String>,
}

impl FakeTree {
    pub fn add_node(&self, kind: &str, name: Option<&str>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new();
        self.kinds.insert(id, NodeKind::new(kind));
        if let Some(name) = name {
            self.names.insert(id, name.to_string());
        }
        if let Some(parent) = parent {
            self.parents.insert(id, parent);
        }
        id
    }

    pub fn remove_node(&self, node: NodeId) {
        self.kinds.remove(&node);
        self.names.remove(&node);
        self.parents.remove(&node);
    }
}

impl ConfigTree for FakeTree {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(&node).map(|p| *p)
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.kinds.get(&node).map(|k| k.clone())
    }

    fn raw_field(&self, node: NodeId, field: &str) -> Option<String> {
        if field == "name" {
            self.names.get(&node).map(|n| n.clone())
        } else {
            None
        }
    }

    fn single_child_of_kind(&self, _node: NodeId, _kind: &str) -> Option<String> {
        None
    }

    fn contains(&self, node: NodeId) -> bool {
        self.kinds.contains_key(&node)
    }
}

/// Management registry fake with a journal of binds in order.
#[derive(Default)]
pub struct RecordingRegistry {
    bind_seq: AtomicU64,
    pub binds: Mutex<Vec<(Handle, u64)>>,
    pub unbinds: Mutex<Vec<Handle>>,
    reject_names: DashMap<String, ()>,
}

impl RecordingRegistry {
    pub fn reject_name(&self, name: &str) {
        self.reject_names.insert(name.to_string(), ());
    }

    pub fn reject_names_clear(&self) {
        self.reject_names.clear();
    }

    /// The journal position at which `handle` was bound, if ever.
    pub fn bind_order(&self, handle: &Handle) -> Option<u64> {
        self.binds
            .lock()
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, seq)| *seq)
    }
}

impl ManagementRegistry for RecordingRegistry {
    fn bind(&self, parent: &Handle, kind: &NodeKind, name: &str) -> Result<Handle> {
        if self.reject_names.contains_key(name) {
            return Err(VantageError::internal("bind rejected by test registry"));
        }
        let handle = parent.child(kind.as_str(), name);
        let seq = self.bind_seq.fetch_add(1, Ordering::SeqCst);
        self.binds.lock().push((handle.clone(), seq));
        Ok(handle)
    }

    fn unbind(&self, handle: &Handle) -> Result<()> {
        self.unbinds.lock().push(handle.clone());
        Ok(())
    }

    fn root_handle(&self) -> Handle {
        Handle::root("test")
    }
}

/// Proxy that records every attribute change it receives.
#[derive(Default)]
pub struct RecordingProxy {
    pub changes: Mutex<Vec<(String, Option<String>, Option<String>)>>,
}

impl NodeProxy for RecordingProxy {
    fn attribute_changed(&self, field: &str, old: Option<&str>, new: Option<&str>) {
        self.changes.lock().push((
            field.to_string(),
            old.map(String::from),
            new.map(String::from),
        ));
    }
}

/// Factory that keeps every proxy it created, keyed by node.
#[derive(Default)]
pub struct RecordingProxyFactory {
    pub proxies: DashMap<NodeId, Arc<RecordingProxy>>,
}

impl RecordingProxyFactory {
    pub fn proxy(&self, node: NodeId) -> Option<Arc<RecordingProxy>> {
        self.proxies.get(&node).map(|p| p.clone())
    }

    pub fn created_count(&self) -> usize {
        self.proxies.len()
    }
}

impl ProxyFactory for RecordingProxyFactory {
    fn create(&self, node: NodeId, _handle: &Handle) -> Arc<dyn NodeProxy> {
        let proxy = Arc::new(RecordingProxy::default());
        self.proxies.insert(node, proxy.clone());
        proxy
    }
}

/// Job queue that counts submissions, delegating everything else.
#[derive(Default)]
pub struct CountingQueue {
    inner: InMemoryJobQueue,
    adds: AtomicU64,
}

impl CountingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adds(&self) -> u64 {
        self.adds.load(Ordering::SeqCst)
    }
}

impl JobQueue for CountingQueue {
    fn add(&self, job: RegistrationJob) {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.inner.add(job);
    }

    fn take(&self) -> Option<RegistrationJob> {
        self.inner.take()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn close(&self) {
        self.inner.close();
    }
}

/// Readiness gate controlled by the test.
pub struct ManualGate {
    ready: Latch,
    pub published: Mutex<Option<Handle>>,
    pub retracted: AtomicBool,
}

impl ManualGate {
    /// A gate whose prerequisite is already available.
    pub fn ready() -> Self {
        let gate = Self {
            ready: Latch::new(),
            published: Mutex::new(None),
            retracted: AtomicBool::new(false),
        };
        gate.ready.release();
        gate
    }
}

impl ReadinessGate for ManualGate {
    fn await_ready(&self) {
        self.ready.wait();
    }

    fn publish_ready(&self, root: Handle) {
        *self.published.lock() = Some(root);
    }

    fn retract(&self) {
        self.retracted.store(true, Ordering::SeqCst);
    }
}
