//! Background worker that drains the pending queue.
//!
//! One dedicated thread moves through three states: draining the initial
//! backlog, steady-state draining, stopped. The transition out of the first
//! state releases the initial-drain latch, which is what `start()` blocks on.
//! Emptiness is detected by a peek before each blocking take; the resulting
//! latch release is an approximate "backlog drained" signal, not a hard
//! barrier against jobs enqueued in the same instant.

use crate::engine::RegistrationEngine;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};
use vantage_core::{JobQueue, Latch, Result, VantageError};

/// The queue-draining background worker.
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    quit: Arc<AtomicBool>,
    initial_drain: Arc<Latch>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self {
            queue,
            quit: Arc::new(AtomicBool::new(false)),
            initial_drain: Arc::new(Latch::new()),
            thread: Mutex::new(None),
        }
    }

    /// Latch released once the backlog present at startup has been attempted.
    pub fn initial_drain(&self) -> Arc<Latch> {
        self.initial_drain.clone()
    }

    /// Spawn the drain thread. Fails if the worker was already started.
    pub fn start(&self, engine: Arc<RegistrationEngine>, thread_name: &str) -> Result<()> {
        let mut slot = self.thread.lock();
        if slot.is_some() {
            return Err(VantageError::internal("worker already started"));
        }

        let queue = self.queue.clone();
        let quit = self.quit.clone();
        let initial_drain = self.initial_drain.clone();

        let handle = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    drain_loop(&*queue, &engine, &quit, &initial_drain);
                }));

                if outcome.is_err() {
                    // The pipeline stops making progress from here on; this
                    // is fatal and requires an external restart.
                    error!(
                        "Registration worker terminated by an unexpected panic; \
                         no further registrations will be processed"
                    );
                    // Nobody will take from the queue again; unblock any
                    // submitter waiting on a queued job.
                    queue.close();
                    while let Some(job) = queue.take() {
                        job.done.release();
                    }
                }

                // A caller blocked on startup must not hang once the worker
                // is gone, whatever the reason for the exit.
                initial_drain.release();
            })
            .map_err(|e| VantageError::internal(format!("failed to spawn worker thread: {}", e)))?;

        *slot = Some(handle);
        Ok(())
    }

    /// Request a cooperative stop and wait for the thread to exit.
    ///
    /// An in-flight registration completes; only the wait for the next job
    /// is interrupted. Idempotent.
    pub fn stop(&self) {
        self.quit.store(true, Ordering::SeqCst);
        self.queue.close();

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Registration worker thread panicked before shutdown");
            }
        }
    }
}

fn drain_loop(
    queue: &dyn JobQueue,
    engine: &RegistrationEngine,
    quit: &AtomicBool,
    initial_drain: &Latch,
) {
    let mut draining_initial = true;
    info!("Registration worker started, draining initial backlog");

    loop {
        if quit.load(Ordering::SeqCst) {
            break;
        }

        if draining_initial && queue.is_empty() {
            draining_initial = false;
            initial_drain.release();
            info!("Initial registration backlog drained");
        }

        let Some(job) = queue.take() else {
            break;
        };

        // Per-job failures are contained here; the worker always proceeds
        // to the next job.
        match engine.register_with_ancestors(job.node) {
            Ok(handle) => debug!(node = %job.node, handle = %handle, "Processed registration job"),
            Err(e) => warn!(node = %job.node, cause = %e, "Registration job failed"),
        }

        job.done.release();
    }

    // Jobs stranded behind the quit point still carry completion latches a
    // committing thread may be blocked on. The queue is closed by now, so
    // this drains to None instead of blocking.
    while let Some(job) = queue.take() {
        debug!(node = %job.node, "Dropping queued job during shutdown");
        job.done.release();
    }

    info!("Registration worker stopped");
}
