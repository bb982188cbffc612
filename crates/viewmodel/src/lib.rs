//! Form view-model: named single-occupancy entity slots plus a save path.
//!
//! A slot holds zero or one entity reference. Setting an occupied slot is
//! rejected as a no-op until the slot is explicitly cleared; rejection is
//! an outcome, not an error.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use shared::domain::EntityRef;
use shared::error::SaveError;

/// Fixed string key naming one slot within a view-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotKey(pub &'static str);

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit,
}

/// Outcome of a slot write. `Occupied` means the existing value was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    Set,
    Occupied,
}

/// Point-in-time view of the form handed to persistence.
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub mode: FormMode,
    pub slots: Vec<(SlotKey, EntityRef)>,
}

/// Persistence seam behind `FormViewModel::save`.
pub trait Persistence {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), SaveError>;
}

pub struct FormViewModel {
    mode: FormMode,
    slots: HashMap<SlotKey, EntityRef>,
    store: Rc<dyn Persistence>,
}

impl FormViewModel {
    pub fn new(mode: FormMode, store: Rc<dyn Persistence>) -> Self {
        Self {
            mode,
            slots: HashMap::new(),
            store,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: FormMode) {
        self.mode = mode;
    }

    pub fn get(&self, slot: SlotKey) -> Option<&EntityRef> {
        self.slots.get(&slot)
    }

    pub fn is_empty_slot(&self, slot: SlotKey) -> bool {
        !self.slots.contains_key(&slot)
    }

    /// Assigns `entity` to `slot` if the slot is empty. An occupied slot
    /// keeps its current value.
    pub fn set(&mut self, slot: SlotKey, entity: EntityRef) -> SlotWrite {
        if self.slots.contains_key(&slot) {
            tracing::debug!(%slot, "slot occupied; keeping existing value");
            return SlotWrite::Occupied;
        }
        self.slots.insert(slot, entity);
        SlotWrite::Set
    }

    /// Empties `slot`, returning the previous value if there was one.
    pub fn clear(&mut self, slot: SlotKey) -> Option<EntityRef> {
        self.slots.remove(&slot)
    }

    /// Clears every slot. The form mode survives a reset.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let mut slots: Vec<(SlotKey, EntityRef)> = self
            .slots
            .iter()
            .map(|(key, entity)| (*key, entity.clone()))
            .collect();
        slots.sort_by_key(|(key, _)| key.0);
        FormSnapshot {
            mode: self.mode,
            slots,
        }
    }

    pub fn save(&self) -> Result<(), SaveError> {
        self.store.save(&self.snapshot())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
