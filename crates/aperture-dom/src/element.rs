//! Element proxies and event handler registries

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::DomEvent;

pub type EventHandler = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// Token returned by subscribe, required to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Subscription {
    id: HandlerId,
    handler: EventHandler,
}

#[derive(Default)]
struct Element {
    // Per event type, in subscription order.
    handlers: HashMap<String, Vec<Subscription>>,
}

/// Host-side proxies for content elements, keyed by node id.
#[derive(Default)]
pub struct ElementRegistry {
    elements: RwLock<HashMap<String, Element>>,
    next_handler: AtomicU64,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a proxy for a content element.
    pub fn insert(&self, node_id: impl Into<String>) {
        self.elements
            .write()
            .entry(node_id.into())
            .or_default();
    }

    /// Detach a proxy; pending events for it are ignored from then on.
    pub fn remove(&self, node_id: &str) -> bool {
        self.elements.write().remove(node_id).is_some()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.elements.read().contains_key(node_id)
    }

    /// Subscribe a handler to an event type on an element. Subscribing
    /// registers the proxy if it was not known yet.
    pub fn on(
        &self,
        node_id: &str,
        event_type: &str,
        handler: EventHandler,
    ) -> HandlerId {
        let id = HandlerId(self.next_handler.fetch_add(1, Ordering::Relaxed));
        self.elements
            .write()
            .entry(node_id.to_string())
            .or_default()
            .handlers
            .entry(event_type.to_string())
            .or_default()
            .push(Subscription { id, handler });
        id
    }

    /// Unsubscribe a handler. An unknown id is logged and ignored.
    pub fn off(&self, node_id: &str, event_type: &str, id: HandlerId) {
        let mut elements = self.elements.write();
        let removed = elements
            .get_mut(node_id)
            .and_then(|e| e.handlers.get_mut(event_type))
            .map(|subscriptions| {
                let before = subscriptions.len();
                subscriptions.retain(|s| s.id != id);
                subscriptions.len() != before
            })
            .unwrap_or(false);

        if !removed {
            tracing::warn!(
                node_id = %node_id,
                event_type = %event_type,
                "event handler not found"
            );
        }
    }

    /// Handlers registered for `event_type` on `node_id`, in subscription
    /// order. `None` when the element is unknown.
    pub fn handlers_for(&self, node_id: &str, event_type: &str) -> Option<Vec<EventHandler>> {
        let elements = self.elements.read();
        let element = elements.get(node_id)?;
        Some(
            element
                .handlers
                .get(event_type)
                .map(|subscriptions| {
                    subscriptions
                        .iter()
                        .map(|s| Arc::clone(&s.handler))
                        .collect()
                })
                .unwrap_or_default(),
        )
    }
}
