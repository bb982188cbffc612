//! Topic-scoped typed event bus and the activity-stream channel registry.
//!
//! Both are plain values injected into whatever owns them, scoped to the
//! application shell rather than ambient process-wide state. Everything
//! here runs on the UI thread; interior mutability is `RefCell`, and
//! publish is safe for same-thread reentrancy (a handler may publish).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use shared::error::StreamError;
use shared::events::{EventKind, FormEvent};
use shared::topic::TopicKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&FormEvent)>;

struct HandlerEntry {
    id: SubscriptionId,
    handler: Handler,
}

/// Publish/subscribe router keyed by (topic, event kind).
///
/// Subscribers registered for a topic and kind receive only events of that
/// kind published on that exact topic, in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    handlers: RefCell<HashMap<(TopicKey, EventKind), Vec<HandlerEntry>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        topic: TopicKey,
        kind: EventKind,
        handler: impl Fn(&FormEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry((topic, kind))
            .or_default()
            .push(HandlerEntry {
                id,
                handler: Rc::new(handler),
            });
        tracing::debug!(%topic, ?kind, "subscribed to form events");
        id
    }

    pub fn unsubscribe(&self, topic: TopicKey, kind: EventKind, id: SubscriptionId) {
        let mut handlers = self.handlers.borrow_mut();
        if let Some(entries) = handlers.get_mut(&(topic, kind)) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                handlers.remove(&(topic, kind));
            }
        }
    }

    /// Delivers `event` to every handler subscribed to (`topic`, kind of
    /// `event`), in subscription order. The handler list is snapshotted
    /// before dispatch so handlers may publish or subscribe reentrantly;
    /// subscriptions added during dispatch see only later events.
    pub fn publish(&self, topic: TopicKey, event: &FormEvent) {
        let kind = event.kind();
        tracing::debug!(%topic, ?kind, "publishing form event");
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&(topic, kind))
            .map(|entries| entries.iter().map(|entry| Rc::clone(&entry.handler)).collect())
            .unwrap_or_default();
        for handler in snapshot {
            handler(event);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityStreamInfo {
    pub key: TopicKey,
    pub label: String,
}

/// Registry of active activity-stream channels, keyed by topic.
///
/// A channel is created when a chapter window opens, looked up by panels
/// for the window's lifetime, and deleted exactly once when the window
/// closes. Create of an existing key and get/delete of a missing key are
/// lifecycle errors.
#[derive(Default)]
pub struct StreamRegistry {
    streams: RefCell<HashMap<TopicKey, ActivityStreamInfo>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, key: TopicKey, label: impl Into<String>) -> Result<(), StreamError> {
        let mut streams = self.streams.borrow_mut();
        if streams.contains_key(&key) {
            return Err(StreamError::AlreadyRegistered(key));
        }
        let label = label.into();
        tracing::info!(%key, %label, "registering activity stream");
        streams.insert(key, ActivityStreamInfo { key, label });
        Ok(())
    }

    pub fn get(&self, key: TopicKey) -> Result<ActivityStreamInfo, StreamError> {
        self.streams
            .borrow()
            .get(&key)
            .cloned()
            .ok_or(StreamError::NotRegistered(key))
    }

    pub fn contains(&self, key: TopicKey) -> bool {
        self.streams.borrow().contains_key(&key)
    }

    pub fn delete(&self, key: TopicKey) -> Result<(), StreamError> {
        let removed = self.streams.borrow_mut().remove(&key);
        match removed {
            Some(info) => {
                tracing::info!(%key, label = %info.label, "deleted activity stream");
                Ok(())
            }
            None => Err(StreamError::NotRegistered(key)),
        }
    }

    pub fn len(&self) -> usize {
        self.streams.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.borrow().is_empty()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
