//! Toolkit-independent two-phase drop protocol.
//!
//! A gesture first *proposes* its payload against a destination slot; only
//! an accepted proposal is *committed*, which resolves the identity and
//! mutates the slot. Visual hover feedback belongs to the GUI layer and is
//! not part of this contract.

use shared::domain::{EntityRef, PublicId};

/// What a drag gesture carries. Only entity identities are meaningful to
/// slot targets; anything else is rejected at the propose phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    EntityIdentity(PublicId),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    /// The payload does not name a terminology entity.
    NotAnEntity,
    /// The destination slot already holds a value.
    SlotOccupied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropProposal {
    Accepted(PublicId),
    Rejected(DropRejection),
}

impl DropProposal {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DropProposal::Accepted(_))
    }
}

/// Result of a committed drop. `Ignored` covers the slot filling up
/// between propose and commit; the existing value is kept and no save
/// runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Committed(EntityRef),
    Ignored,
}
