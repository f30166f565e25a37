//! Default in-memory implementation of the pending-queue contract.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use vantage_core::{JobQueue, RegistrationJob};

struct QueueState {
    jobs: VecDeque<RegistrationJob>,
    closed: bool,
}

/// Blocking FIFO queue of registration jobs.
///
/// Producers are arbitrary committing threads; the single consumer is the
/// worker. `close()` wakes blocked takers, but jobs already queued are still
/// handed out before `take()` starts returning `None`.
pub struct InMemoryJobQueue {
    state: Mutex<QueueState>,
    cond: Condvar,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue for InMemoryJobQueue {
    fn add(&self, job: RegistrationJob) {
        let mut state = self.state.lock();
        if state.closed {
            // Late submissions after shutdown are dropped; the job latch is
            // released so a waiting submitter cannot hang.
            job.done.release();
            return;
        }
        state.jobs.push_back(job);
        self.cond.notify_one();
    }

    fn take(&self) -> Option<RegistrationJob> {
        let mut state = self.state.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.closed {
                return None;
            }
            self.cond.wait(&mut state);
        }
    }

    fn is_empty(&self) -> bool {
        self.state.lock().jobs.is_empty()
    }

    fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            self.cond.notify_all();
        }
    }
}
