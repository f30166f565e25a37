//! End-to-end scenarios for the registration pipeline, driven through the
//! controller with fake collaborators.

mod common;

use common::{CountingQueue, FakeTree, ManualGate, RecordingProxyFactory, RecordingRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vantage_core::{ChangeRecord, NodeId, PipelineConfig};
use vantage_pipeline::{InMemoryJobQueue, PipelineController};

struct Harness {
    tree: Arc<FakeTree>,
    registry: Arc<RecordingRegistry>,
    factory: Arc<RecordingProxyFactory>,
    gate: Arc<ManualGate>,
    controller: PipelineController,
    root: NodeId,
}

impl Harness {
    /// A pipeline over a tree containing just the root node.
    fn new() -> Self {
        common::init_tracing();
        let tree = Arc::new(FakeTree::default());
        let registry = Arc::new(RecordingRegistry::default());
        let factory = Arc::new(RecordingProxyFactory::default());
        let gate = Arc::new(ManualGate::ready());
        let root = tree.add_node("domain", Some("root"), None);

        let mut config = PipelineConfig::default();
        config.startup_timeout_secs = 5;

        let controller = PipelineController::new(
            config,
            tree.clone(),
            registry.clone(),
            factory.clone(),
            gate.clone(),
            Arc::new(InMemoryJobQueue::new()),
            root,
        );

        Self {
            tree,
            registry,
            factory,
            gate,
            controller,
            root,
        }
    }

    /// Enqueue the root's add and run startup.
    fn start_with_root(&self) -> vantage_core::Handle {
        self.controller
            .on_change_batch_committed(&[ChangeRecord::added(self.root, "children", self.root)]);
        self.controller.start().expect("pipeline should start")
    }
}

fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn scenario_a_start_returns_root_handle() {
    let h = Harness::new();

    let handle = h.start_with_root();

    assert_eq!(h.controller.node_registry().len(), 1);
    assert_eq!(
        h.controller.node_registry().handle_of(h.root),
        Some(handle.clone())
    );
    assert_eq!(h.gate.published.lock().clone(), Some(handle));

    h.controller.stop();
    assert!(h.gate.retracted.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn scenario_b_parent_bound_before_child_within_one_batch() {
    let h = Harness::new();
    let child = h.tree.add_node("server", Some("main"), Some(h.root));

    h.controller.on_change_batch_committed(&[
        ChangeRecord::added(h.root, "children", h.root),
        ChangeRecord::added(h.root, "servers", child),
    ]);
    h.controller.start().unwrap();

    let nodes = h.controller.node_registry();
    assert!(wait_until(Duration::from_secs(5), || nodes.len() == 2));

    let root_handle = nodes.handle_of(h.root).unwrap();
    let child_handle = nodes.handle_of(child).unwrap();
    assert!(child_handle.is_under(&root_handle));
    assert!(h.registry.bind_order(&root_handle).unwrap() < h.registry.bind_order(&child_handle).unwrap());
    assert!(nodes.bound_seq(h.root).unwrap() < nodes.bound_seq(child).unwrap());

    h.controller.stop();
}

#[test]
fn scenario_c_remove_is_immediate_and_repeat_remove_is_noop() {
    let h = Harness::new();
    h.start_with_root();

    h.tree.remove_node(h.root);
    h.controller
        .on_change_batch_committed(&[ChangeRecord::removed(h.root, "children", h.root)]);

    assert!(h.controller.node_registry().is_empty());
    assert_eq!(h.registry.unbinds.lock().len(), 1);

    // A second remove for the same node finds nothing and changes nothing.
    h.controller
        .on_change_batch_committed(&[ChangeRecord::removed(h.root, "children", h.root)]);
    assert!(h.controller.node_registry().is_empty());
    assert_eq!(h.registry.unbinds.lock().len(), 1);

    h.controller.stop();
}

#[test]
fn scenario_d_attribute_change_without_add_registers_on_demand() {
    let h = Harness::new();
    h.start_with_root();

    // The orphan exists in the tree but no add event was ever delivered.
    let orphan = h.tree.add_node("server", Some("stray"), Some(h.root));

    h.controller.on_change_batch_committed(&[ChangeRecord::updated(
        orphan,
        "port",
        None,
        Some("8080"),
    )]);

    // The node was registered before the change was applied.
    let nodes = h.controller.node_registry();
    assert!(nodes.is_registered(orphan));

    let proxy = h.factory.proxy(orphan).expect("proxy created at bind time");
    let changes = proxy.changes.lock();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0], ("port".to_string(), None, Some("8080".to_string())));
    drop(changes);

    // Root plus the orphan, each bound exactly once.
    assert_eq!(h.factory.created_count(), 2);

    h.controller.stop();
}

#[test]
fn scenario_e_concurrent_unrelated_chains_each_stay_parent_first() {
    let h = Harness::new();
    h.start_with_root();

    let parent_a = h.tree.add_node("server", Some("a"), Some(h.root));
    let leaf_a = h.tree.add_node("datasource", Some("db-a"), Some(parent_a));
    let parent_b = h.tree.add_node("server", Some("b"), Some(h.root));
    let leaf_b = h.tree.add_node("datasource", Some("db-b"), Some(parent_b));

    let controller = &h.controller;
    std::thread::scope(|scope| {
        scope.spawn(|| {
            controller.on_change_batch_committed(&[ChangeRecord::added(parent_a, "ds", leaf_a)]);
        });
        scope.spawn(|| {
            controller.on_change_batch_committed(&[ChangeRecord::added(parent_b, "ds", leaf_b)]);
        });
    });

    let nodes = h.controller.node_registry();
    assert!(wait_until(Duration::from_secs(5), || {
        nodes.is_registered(leaf_a) && nodes.is_registered(leaf_b)
    }));

    // No relative order is asserted between the two chains; each chain
    // individually satisfies parent-first.
    for (parent, leaf) in [(parent_a, leaf_a), (parent_b, leaf_b)] {
        assert!(nodes.bound_seq(h.root).unwrap() < nodes.bound_seq(parent).unwrap());
        assert!(nodes.bound_seq(parent).unwrap() < nodes.bound_seq(leaf).unwrap());
    }

    h.controller.stop();
}

#[test]
fn attribute_change_with_equal_values_is_not_propagated() {
    let h = Harness::new();
    h.start_with_root();

    h.controller.on_change_batch_committed(&[ChangeRecord::updated(
        h.root,
        "name",
        Some("root"),
        Some("root"),
    )]);

    let proxy = h.factory.proxy(h.root).unwrap();
    assert!(proxy.changes.lock().is_empty());

    h.controller.stop();
}

#[test]
fn failed_bind_leaves_node_out_and_later_change_retries() {
    let h = Harness::new();
    h.start_with_root();

    let flaky = h.tree.add_node("server", Some("flaky"), Some(h.root));
    h.registry.reject_name("flaky");

    h.controller
        .on_change_batch_committed(&[ChangeRecord::added(h.root, "servers", flaky)]);

    // The worker attempted and failed; the node stays untracked.
    let nodes = h.controller.node_registry();
    assert!(wait_until(Duration::from_secs(2), || !nodes.is_registered(flaky)));
    std::thread::sleep(Duration::from_millis(50));
    assert!(!nodes.is_registered(flaky));

    // A later batch touching the node triggers the workaround path, which
    // succeeds once the registry accepts the name again.
    h.registry.binds.lock().clear();
    h.registry.reject_names_clear();
    h.controller.on_change_batch_committed(&[ChangeRecord::updated(
        flaky,
        "port",
        None,
        Some("9090"),
    )]);

    assert!(nodes.is_registered(flaky));
    let proxy = h.factory.proxy(flaky).unwrap();
    assert_eq!(proxy.changes.lock().len(), 1);

    h.controller.stop();
}

#[test]
fn re_adding_a_registered_node_enqueues_no_new_job() {
    common::init_tracing();
    let tree = Arc::new(FakeTree::default());
    let registry = Arc::new(RecordingRegistry::default());
    let factory = Arc::new(RecordingProxyFactory::default());
    let root = tree.add_node("domain", Some("root"), None);
    let queue = Arc::new(CountingQueue::new());

    let mut config = PipelineConfig::default();
    config.startup_timeout_secs = 5;

    let controller = PipelineController::new(
        config,
        tree,
        registry.clone(),
        factory,
        Arc::new(ManualGate::ready()),
        queue.clone(),
        root,
    );

    controller.on_change_batch_committed(&[ChangeRecord::added(root, "children", root)]);
    controller.start().unwrap();
    assert_eq!(queue.adds(), 1);

    // A duplicate add for a node that is already bound is dropped before it
    // reaches the queue.
    controller.on_change_batch_committed(&[ChangeRecord::added(root, "children", root)]);
    assert_eq!(queue.adds(), 1);
    assert_eq!(registry.binds.lock().len(), 1);

    controller.stop();
}

#[test]
fn startup_fails_when_root_never_appears() {
    let tree = Arc::new(FakeTree::default());
    let registry = Arc::new(RecordingRegistry::default());
    let factory = Arc::new(RecordingProxyFactory::default());
    let gate = Arc::new(ManualGate::ready());
    let root = tree.add_node("domain", Some("root"), None);

    let mut config = PipelineConfig::default();
    config.startup_timeout_secs = 1;

    let controller = PipelineController::new(
        config,
        tree,
        registry,
        factory,
        gate,
        Arc::new(InMemoryJobQueue::new()),
        root,
    );

    // No batch ever mentioned the root: the backlog drains empty and the
    // root handle cannot be resolved.
    let err = controller.start().unwrap_err();
    assert!(matches!(err, vantage_core::VantageError::Startup(_)));

    controller.stop();
}
