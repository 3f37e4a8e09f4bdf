//! Worker pool for host callables and event handlers
//!
//! Host logic never runs on the thread that owns the rendering surface.
//! Calls and event handlers are submitted here instead of spawning a thread
//! apiece; the queue is bounded and saturation follows the configured
//! overflow policy. Jobs run to completion, there is no cancellation.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// What `submit` does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail the submission; the job is dropped and the caller is told.
    Reject,
    /// Block the submitting thread until a worker drains the queue.
    Block,
}

struct PoolState {
    queue: VecDeque<Job>,
    shutdown: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    policy: OverflowPolicy,
}

pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(
        workers: usize,
        capacity: usize,
        policy: OverflowPolicy,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::with_capacity(capacity),
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: capacity.max(1),
            policy,
        });

        let mut handles = Vec::with_capacity(workers.max(1));
        for i in 0..workers.max(1) {
            let shared = Arc::clone(&shared);
            let handle = std::thread::Builder::new()
                .name(format!("aperture-worker-{}", i))
                .spawn(move || worker_loop(shared))?;
            handles.push(handle);
        }

        Ok(Self {
            shared,
            workers: handles,
        })
    }

    /// Queue a job for execution on a worker thread.
    pub fn submit<F>(&self, job: F) -> Result<(), BridgeError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        loop {
            if state.shutdown {
                return Err(BridgeError::PoolShutDown);
            }
            if state.queue.len() < self.shared.capacity {
                break;
            }
            match self.shared.policy {
                OverflowPolicy::Reject => return Err(BridgeError::PoolSaturated),
                OverflowPolicy::Block => self.shared.not_full.wait(&mut state),
            }
        }

        state.queue.push_back(Box::new(job));
        drop(state);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    pub fn queued(&self) -> usize {
        self.shared.state.lock().queue.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            // Jobs still queued at teardown are dropped, not run.
            state.queue.clear();
        }
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread terminated by panic");
            }
        }
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.queue.pop_front() {
                    shared.not_full.notify_one();
                    break job;
                }
                if state.shutdown {
                    return;
                }
                shared.not_empty.wait(&mut state);
            }
        };

        // Last-resort guard; dispatch packages its own panics as results.
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!("worker job panicked");
        }
    }
}
