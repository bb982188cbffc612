//! Analyte group form controller: binds the analyte, result, and specimen
//! slots of one view-model to drop gestures and to the window's topic on
//! the event bus.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use directory::EntityResolver;
use eventbus::{EventBus, SubscriptionId};
use shared::domain::{EntityRef, PublicId};
use shared::error::DropError;
use shared::events::{EventKind, FormEvent, InterpretationSummary};
use shared::topic::TopicKey;
use viewmodel::{FormViewModel, SlotKey, SlotWrite};

use crate::dragdrop::{DragPayload, DropOutcome, DropProposal, DropRejection};

pub const ANALYTE_ENTITY: SlotKey = SlotKey("analyte_entity");
pub const RESULTS_ENTITY: SlotKey = SlotKey("results_entity");
pub const SPECIMEN_ENTITY: SlotKey = SlotKey("specimen_entity");

pub struct AnalyteGroupForm {
    topic: TopicKey,
    view_model: Rc<RefCell<FormViewModel>>,
    bus: Rc<EventBus>,
    resolver: Rc<dyn EntityResolver>,
    manual_result_sub: SubscriptionId,
}

impl AnalyteGroupForm {
    /// Binds the form to its window topic. Subscribes for manually entered
    /// results published on the same topic; those land in the result slot
    /// under the usual occupancy rule.
    pub fn new(
        topic: TopicKey,
        view_model: Rc<RefCell<FormViewModel>>,
        bus: Rc<EventBus>,
        resolver: Rc<dyn EntityResolver>,
    ) -> Self {
        let vm = Rc::clone(&view_model);
        let manual_result_sub =
            bus.subscribe(topic, EventKind::ResultAddedToGroup, move |event| {
                if let FormEvent::ResultAddedToGroup { entity } = event {
                    if vm.borrow_mut().set(RESULTS_ENTITY, entity.clone()) == SlotWrite::Occupied {
                        tracing::debug!(
                            entity = %entity.description,
                            "manual result ignored; result slot occupied"
                        );
                    }
                }
            });

        Self {
            topic,
            view_model,
            bus,
            resolver,
            manual_result_sub,
        }
    }

    pub fn topic(&self) -> TopicKey {
        self.topic
    }

    pub fn view_model(&self) -> &Rc<RefCell<FormViewModel>> {
        &self.view_model
    }

    /// Phase one of a drop: inspect the payload against `slot` without
    /// mutating anything.
    pub fn propose_drop(&self, slot: SlotKey, payload: &DragPayload) -> DropProposal {
        let DragPayload::EntityIdentity(public_id) = payload else {
            return DropProposal::Rejected(DropRejection::NotAnEntity);
        };
        if !self.view_model.borrow().is_empty_slot(slot) {
            return DropProposal::Rejected(DropRejection::SlotOccupied);
        }
        DropProposal::Accepted(*public_id)
    }

    /// Phase two: resolve the identity and, if the slot is still empty,
    /// set it and save. A lookup failure aborts with the slot unchanged;
    /// an occupied slot is a silent no-op.
    pub fn commit_drop(
        &self,
        slot: SlotKey,
        public_id: PublicId,
    ) -> Result<DropOutcome, DropError> {
        if !self.view_model.borrow().is_empty_slot(slot) {
            return Ok(DropOutcome::Ignored);
        }

        let entity = self.resolver.resolve_identity(public_id)?;
        let written = self.view_model.borrow_mut().set(slot, entity.clone());
        match written {
            SlotWrite::Set => {
                self.view_model.borrow().save()?;
                tracing::info!(%slot, entity = %entity.description, "drop committed");
                Ok(DropOutcome::Committed(entity))
            }
            SlotWrite::Occupied => Ok(DropOutcome::Ignored),
        }
    }

    /// Explicit clear affordance on a filled entry.
    pub fn clear_slot(&self, slot: SlotKey) -> Option<EntityRef> {
        self.view_model.borrow_mut().clear(slot)
    }

    /// Asks the window's manual result entry panel to open.
    pub fn request_manual_entry(&self) {
        self.bus.publish(self.topic, &FormEvent::ManualEntryRequested);
    }

    /// The "done" action: publishes the assembled interpretation for the
    /// details panel, then asks the properties panel to close.
    pub fn confirm(&self) {
        let summary = {
            let vm = self.view_model.borrow();
            InterpretationSummary {
                analyte: vm.get(ANALYTE_ENTITY).cloned(),
                result: vm.get(RESULTS_ENTITY).cloned(),
                specimen: vm.get(SPECIMEN_ENTITY).cloned(),
                recorded_at: Utc::now(),
            }
        };
        self.bus
            .publish(self.topic, &FormEvent::InterpretationAdded { summary });
        self.bus.publish(self.topic, &FormEvent::PanelClosed);
    }

    /// Discards the form contents and asks the properties panel to close.
    pub fn cancel(&self) {
        self.view_model.borrow_mut().reset();
        self.bus.publish(self.topic, &FormEvent::PanelClosed);
    }

    pub fn clear_form(&self) {
        self.view_model.borrow_mut().reset();
    }
}

impl Drop for AnalyteGroupForm {
    fn drop(&mut self) {
        self.bus
            .unsubscribe(self.topic, EventKind::ResultAddedToGroup, self.manual_result_sub);
    }
}
