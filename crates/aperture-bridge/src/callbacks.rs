//! Async callback correlation
//!
//! When the host evaluates content-side code expecting an asynchronous
//! result, the callback is parked here under a correlation id. The content
//! reports completion through the privileged async-delivery function and the
//! dispatcher resolves the id. At-most-once delivery: the entry is removed
//! on resolve, and a duplicate or spurious resolve is logged, not a crash.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;

type AsyncCallback = Box<dyn FnOnce(Option<Value>) + Send + 'static>;

#[derive(Default)]
pub struct AsyncCallbackRegistry {
    pending: Mutex<HashMap<String, AsyncCallback>>,
}

impl AsyncCallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, correlation_id: impl Into<String>, callback: F)
    where
        F: FnOnce(Option<Value>) + Send + 'static,
    {
        self.pending
            .lock()
            .insert(correlation_id.into(), Box::new(callback));
    }

    /// Invoke and remove the callback registered under `correlation_id`.
    ///
    /// Returns whether a callback was found. A stale id (unknown, or already
    /// consumed) is reported and ignored.
    pub fn resolve(&self, correlation_id: &str, value: Option<Value>) -> bool {
        let callback = self.pending.lock().remove(correlation_id);
        match callback {
            Some(callback) => {
                callback(value);
                true
            }
            None => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    "async callback resolve for unknown or already-consumed id"
                );
                false
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}
