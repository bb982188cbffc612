use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Nid, WindowId};

/// Namespace for name-based topic key derivation. Fixed so that the same
/// topic string always reconnects to the same channel across restarts.
const TOPIC_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x14, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30,
    0xc8,
]);

/// Scoping key for one event-bus channel, one per open window/session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicKey(pub Uuid);

impl TopicKey {
    /// Derives a key from an arbitrary topic string. Deterministic: the
    /// same string always yields the same key.
    pub fn derive(name: &str) -> Self {
        Self(Uuid::new_v5(&TOPIC_NAMESPACE, name.as_bytes()))
    }

    /// Details channel for an existing entity (edit mode). Keyed by the
    /// entity's persistent nid so reopening the entity rejoins the channel.
    pub fn for_entity_details(nid: Nid) -> Self {
        Self::derive(&format!("details-{}", nid.0))
    }

    /// Details channel for a window with no backing entity (create mode).
    /// Keyed by the window's own identity, so two create-mode windows get
    /// distinct channels.
    pub fn for_window_details(window_id: WindowId) -> Self {
        Self::derive(&format!("details-{}", window_id.0))
    }
}

impl std::fmt::Display for TopicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
