use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::EntityRef;

/// Kind discriminator used for subscription filtering on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ResultAddedToGroup,
    InterpretationAdded,
    PanelClosed,
    ManualEntryRequested,
}

/// Result interpretation assembled by the analyte group form when the user
/// confirms: the slot values plus the moment of confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationSummary {
    pub analyte: Option<EntityRef>,
    pub result: Option<EntityRef>,
    pub specimen: Option<EntityRef>,
    pub recorded_at: DateTime<Utc>,
}

/// Events exchanged between panels sharing one window topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FormEvent {
    /// A result entity was produced outside the drop flow (manual entry
    /// panel) and should land in the form's result slot.
    ResultAddedToGroup { entity: EntityRef },
    /// The form was confirmed; carries the assembled interpretation.
    InterpretationAdded { summary: InterpretationSummary },
    /// The properties panel under this topic should close.
    PanelClosed,
    /// The manual result entry panel under this topic should open.
    ManualEntryRequested,
}

impl FormEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FormEvent::ResultAddedToGroup { .. } => EventKind::ResultAddedToGroup,
            FormEvent::InterpretationAdded { .. } => EventKind::InterpretationAdded,
            FormEvent::PanelClosed => EventKind::PanelClosed,
            FormEvent::ManualEntryRequested => EventKind::ManualEntryRequested,
        }
    }
}
