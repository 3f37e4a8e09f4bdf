//! Event relay
//!
//! Forwards boundary-originated DOM events to registered host handlers.
//! Drop events are cross-referenced with the session's drop-path registry
//! first, so handlers see resolved filesystem paths. Handlers run on the
//! worker pool, concurrently, fire-and-forget: no ordering among them and
//! no completion guarantee.

use std::sync::Arc;

use serde_json::Value;

use aperture_bridge::{EventSink, WorkerPool};

use crate::dnd::DropPathRegistry;
use crate::element::ElementRegistry;
use crate::error::DomError;
use crate::event::DomEvent;

pub struct EventRelay {
    elements: Arc<ElementRegistry>,
    drop_paths: Arc<DropPathRegistry>,
    pool: Arc<WorkerPool>,
}

impl EventRelay {
    pub fn new(
        elements: Arc<ElementRegistry>,
        drop_paths: Arc<DropPathRegistry>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            elements,
            drop_paths,
            pool,
        }
    }

    pub fn relay(&self, node_id: &str, mut event: DomEvent) {
        // The element may have been detached since the content fired.
        let Some(handlers) = self.elements.handlers_for(node_id, &event.event_type) else {
            tracing::debug!(node_id = %node_id, "event for unknown element ignored");
            return;
        };

        if event.is_drop() {
            self.resolve_drop_paths(&mut event);
        }

        let event = Arc::new(event);
        for handler in handlers {
            let event = Arc::clone(&event);
            if let Err(e) = self.pool.submit(move || handler(&event)) {
                tracing::error!(
                    node_id = %node_id,
                    error = %e,
                    "dropping DOM event handler"
                );
            }
        }
    }

    /// Attach native paths to dropped files, consuming registry entries.
    /// A file with no pending entry is left unresolved, not an error.
    fn resolve_drop_paths(&self, event: &mut DomEvent) {
        let Some(transfer) = event.data_transfer.as_mut() else {
            return;
        };
        for file in &mut transfer.files {
            match self.drop_paths.take(&file.name) {
                Some(path) => file.full_path = Some(path),
                None => tracing::debug!(
                    name = %file.name,
                    "no native path recorded for dropped file"
                ),
            }
        }
    }

    pub fn relay_value(&self, node_id: &str, event: Value) -> Result<(), DomError> {
        let event: DomEvent = serde_json::from_value(event)?;
        self.relay(node_id, event);
        Ok(())
    }
}

impl EventSink for EventRelay {
    fn dispatch_event(&self, node_id: &str, event: Value) {
        if let Err(e) = self.relay_value(node_id, event) {
            tracing::error!(node_id = %node_id, error = %e, "malformed DOM event payload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_bridge::OverflowPolicy;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::time::Duration;

    fn relay() -> (EventRelay, Arc<ElementRegistry>, Arc<DropPathRegistry>) {
        let elements = Arc::new(ElementRegistry::new());
        let drop_paths = Arc::new(DropPathRegistry::new());
        let pool = Arc::new(WorkerPool::new(2, 16, OverflowPolicy::Block).unwrap());
        (
            EventRelay::new(Arc::clone(&elements), Arc::clone(&drop_paths), pool),
            elements,
            drop_paths,
        )
    }

    #[test]
    fn test_handlers_fan_out() {
        let (relay, elements, _) = relay();
        let (tx, rx) = mpsc::channel();

        for _ in 0..3 {
            let tx = tx.clone();
            elements.on("n-1", "click", Arc::new(move |event: &DomEvent| {
                tx.send(event.event_type.clone()).unwrap();
            }));
        }

        relay.relay("n-1", DomEvent::new("click"));

        for _ in 0..3 {
            assert_eq!(
                rx.recv_timeout(Duration::from_secs(5)).unwrap(),
                "click"
            );
        }
    }

    #[test]
    fn test_unknown_element_is_ignored() {
        let (relay, _, _) = relay();
        // No panic, no handler invocation.
        relay.relay("ghost", DomEvent::new("click"));
    }

    #[test]
    fn test_drop_event_resolves_and_consumes_path() {
        let (relay, elements, drop_paths) = relay();
        let (tx, rx) = mpsc::channel();

        let sender = tx.clone();
        elements.on("zone", "drop", Arc::new(move |event: &DomEvent| {
            let file = &event.data_transfer.as_ref().unwrap().files[0];
            sender.send(file.full_path.clone()).unwrap();
        }));

        drop_paths.record("a.txt", "/tmp/a.txt");

        let drop_event = |relay: &EventRelay| {
            relay.relay_value(
                "zone",
                json!({
                    "type": "drop",
                    "dataTransfer": {"files": [{"name": "a.txt"}]}
                }),
            )
            .unwrap();
        };

        drop_event(&relay);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Some(PathBuf::from("/tmp/a.txt"))
        );
        assert!(drop_paths.is_empty());

        // Same drop again without a fresh native record: path unresolved.
        drop_event(&relay);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), None);
    }

    #[test]
    fn test_malformed_payload_is_logged_not_fatal() {
        let (relay, elements, _) = relay();
        elements.insert("n-1");
        assert!(relay.relay_value("n-1", json!({"missing": "type"})).is_err());
    }
}
