//! Blocking synchronization primitives shared across the pipeline.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// A single-use completion signal.
///
/// A latch starts unreleased, is released at most once (further calls are
/// no-ops), and never resets. Used both as the per-job completion signal and
/// as the worker's "initial backlog drained" gate.
#[derive(Debug, Default)]
pub struct Latch {
    released: Mutex<bool>,
    cond: Condvar,
}

impl Latch {
    /// Create a new unreleased latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the latch, waking all current and future waiters.
    pub fn release(&self) {
        let mut released = self.released.lock();
        if !*released {
            *released = true;
            self.cond.notify_all();
        }
    }

    /// Block until the latch is released.
    pub fn wait(&self) {
        let mut released = self.released.lock();
        while !*released {
            self.cond.wait(&mut released);
        }
    }

    /// Block until the latch is released or `timeout` elapses.
    ///
    /// Returns `true` if the latch was released.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut released = self.released.lock();
        if *released {
            return true;
        }
        self.cond.wait_for(&mut released, timeout);
        *released
    }

    /// Non-blocking check.
    pub fn is_released(&self) -> bool {
        *self.released.lock()
    }
}
