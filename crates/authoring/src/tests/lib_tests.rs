use std::cell::{Cell, RefCell};
use std::rc::Rc;

use directory::EntityDirectory;
use eventbus::{EventBus, StreamRegistry};
use shared::domain::{EntityRef, Nid, PublicId};
use shared::error::{DirectoryError, DropError};
use shared::events::{EventKind, FormEvent};
use shared::topic::TopicKey;
use uuid::Uuid;
use viewmodel::{FormMode, FormSnapshot, FormViewModel, Persistence, SlotKey};

use super::*;

#[derive(Default)]
struct RecordingStore {
    saves: Cell<u32>,
    fail_with: Option<String>,
}

impl Persistence for RecordingStore {
    fn save(&self, _snapshot: &FormSnapshot) -> Result<(), shared::error::SaveError> {
        if let Some(message) = &self.fail_with {
            return Err(shared::error::SaveError::new(message.clone()));
        }
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

struct Fixture {
    bus: Rc<EventBus>,
    registry: Rc<StreamRegistry>,
    resolver: Rc<EntityDirectory>,
    store: Rc<RecordingStore>,
    analyte: EntityRef,
    result: EntityRef,
    specimen: EntityRef,
}

fn entity(nid: i64, name: &str) -> EntityRef {
    EntityRef::concept(
        Nid(nid),
        PublicId(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())),
        name,
    )
}

impl Fixture {
    fn new() -> Self {
        let analyte = entity(1, "SARS-CoV-2 RNA");
        let result = entity(2, "Detected");
        let specimen = entity(3, "Nasopharyngeal swab");

        let mut directory = EntityDirectory::new();
        directory.insert(analyte.clone());
        directory.insert(result.clone());
        directory.insert(specimen.clone());

        Self {
            bus: Rc::new(EventBus::new()),
            registry: Rc::new(StreamRegistry::new()),
            resolver: Rc::new(directory),
            store: Rc::new(RecordingStore::default()),
            analyte,
            result,
            specimen,
        }
    }

    fn form(&self, topic: TopicKey) -> AnalyteGroupForm {
        let vm = Rc::new(RefCell::new(FormViewModel::new(
            FormMode::Create,
            Rc::clone(&self.store) as Rc<dyn Persistence>,
        )));
        AnalyteGroupForm::new(
            topic,
            vm,
            Rc::clone(&self.bus),
            Rc::clone(&self.resolver) as Rc<dyn directory::EntityResolver>,
        )
    }

    fn window(&self, subject: Option<EntityRef>) -> ChapterWindow {
        ChapterWindow::open(
            TopicKey::derive("journal-main"),
            subject,
            Rc::clone(&self.bus),
            Rc::clone(&self.registry),
            Rc::clone(&self.resolver) as Rc<dyn directory::EntityResolver>,
            Rc::clone(&self.store) as Rc<dyn Persistence>,
        )
        .expect("open window")
    }
}

fn slot_nid(form: &AnalyteGroupForm, slot: SlotKey) -> Option<i64> {
    form.view_model().borrow().get(slot).map(|e| e.nid.0)
}

#[test]
fn drop_fills_empty_slot_and_saves_once() {
    let fx = Fixture::new();
    let form = fx.form(TopicKey::derive("details-t1"));

    let payload = DragPayload::EntityIdentity(fx.analyte.public_id);
    let DropProposal::Accepted(public_id) = form.propose_drop(ANALYTE_ENTITY, &payload) else {
        panic!("expected acceptance on an empty slot");
    };
    let outcome = form.commit_drop(ANALYTE_ENTITY, public_id).expect("commit");

    assert_eq!(outcome, DropOutcome::Committed(fx.analyte.clone()));
    assert_eq!(slot_nid(&form, ANALYTE_ENTITY), Some(1));
    assert_eq!(fx.store.saves.get(), 1);
}

#[test]
fn second_drop_into_occupied_slot_is_ignored() {
    let fx = Fixture::new();
    let form = fx.form(TopicKey::derive("details-t2"));

    form.commit_drop(RESULTS_ENTITY, fx.result.public_id)
        .expect("first drop");

    // Propose phase already rejects...
    let payload = DragPayload::EntityIdentity(fx.specimen.public_id);
    assert_eq!(
        form.propose_drop(RESULTS_ENTITY, &payload),
        DropProposal::Rejected(DropRejection::SlotOccupied)
    );

    // ...and a forced commit stays a silent no-op: value kept, no save.
    let outcome = form
        .commit_drop(RESULTS_ENTITY, fx.specimen.public_id)
        .expect("commit");
    assert_eq!(outcome, DropOutcome::Ignored);
    assert_eq!(slot_nid(&form, RESULTS_ENTITY), Some(2));
    assert_eq!(fx.store.saves.get(), 1);
}

#[test]
fn cleared_slot_accepts_a_new_drop() {
    let fx = Fixture::new();
    let form = fx.form(TopicKey::derive("details-t3"));

    form.commit_drop(ANALYTE_ENTITY, fx.analyte.public_id)
        .expect("first drop");
    let removed = form.clear_slot(ANALYTE_ENTITY).expect("cleared value");
    assert_eq!(removed.nid, Nid(1));

    form.commit_drop(ANALYTE_ENTITY, fx.specimen.public_id)
        .expect("second drop");
    assert_eq!(slot_nid(&form, ANALYTE_ENTITY), Some(3));
    assert_eq!(fx.store.saves.get(), 2);
}

#[test]
fn non_entity_payload_is_rejected_at_propose() {
    let fx = Fixture::new();
    let form = fx.form(TopicKey::derive("details-t4"));

    assert_eq!(
        form.propose_drop(ANALYTE_ENTITY, &DragPayload::Text("plain text".into())),
        DropProposal::Rejected(DropRejection::NotAnEntity)
    );
}

#[test]
fn lookup_failure_aborts_commit_and_leaves_slot_empty() {
    let fx = Fixture::new();
    let form = fx.form(TopicKey::derive("details-t5"));

    let ghost = PublicId(Uuid::new_v4());
    let err = form
        .commit_drop(ANALYTE_ENTITY, ghost)
        .expect_err("unknown identity");
    assert!(matches!(
        err,
        DropError::Lookup(DirectoryError::UnknownIdentity(id)) if id == ghost
    ));
    assert!(form.view_model().borrow().is_empty_slot(ANALYTE_ENTITY));
    assert_eq!(fx.store.saves.get(), 0);
}

#[test]
fn save_failure_surfaces_from_commit_with_slot_retained() {
    let fx = Fixture::new();
    let failing = Rc::new(RecordingStore {
        fail_with: Some("store offline".to_string()),
        ..RecordingStore::default()
    });
    let vm = Rc::new(RefCell::new(FormViewModel::new(
        FormMode::Create,
        Rc::clone(&failing) as Rc<dyn Persistence>,
    )));
    let form = AnalyteGroupForm::new(
        TopicKey::derive("details-t12"),
        vm,
        Rc::clone(&fx.bus),
        Rc::clone(&fx.resolver) as Rc<dyn directory::EntityResolver>,
    );

    let err = form
        .commit_drop(ANALYTE_ENTITY, fx.analyte.public_id)
        .expect_err("save should fail");
    assert!(matches!(err, DropError::Save(_)));
    // Set-then-save ordering: the slot keeps its value for a retried save.
    assert_eq!(slot_nid(&form, ANALYTE_ENTITY), Some(1));
    assert_eq!(failing.saves.get(), 0);
}

#[test]
fn manual_result_on_same_topic_fills_result_slot() {
    let fx = Fixture::new();
    let topic = TopicKey::derive("details-t6");
    let form = fx.form(topic);

    fx.bus.publish(
        topic,
        &FormEvent::ResultAddedToGroup {
            entity: fx.result.clone(),
        },
    );
    assert_eq!(slot_nid(&form, RESULTS_ENTITY), Some(2));
}

#[test]
fn manual_result_on_other_topic_is_not_delivered() {
    let fx = Fixture::new();
    let form = fx.form(TopicKey::derive("details-t7"));

    fx.bus.publish(
        TopicKey::derive("details-other"),
        &FormEvent::ResultAddedToGroup {
            entity: fx.result.clone(),
        },
    );
    assert!(form.view_model().borrow().is_empty_slot(RESULTS_ENTITY));
}

#[test]
fn manual_result_respects_occupied_slot() {
    let fx = Fixture::new();
    let topic = TopicKey::derive("details-t8");
    let form = fx.form(topic);

    form.commit_drop(RESULTS_ENTITY, fx.result.public_id)
        .expect("drop");
    fx.bus.publish(
        topic,
        &FormEvent::ResultAddedToGroup {
            entity: fx.specimen.clone(),
        },
    );
    assert_eq!(slot_nid(&form, RESULTS_ENTITY), Some(2));
}

#[test]
fn confirm_publishes_interpretation_then_panel_close() {
    let fx = Fixture::new();
    let topic = TopicKey::derive("details-t9");
    let form = fx.form(topic);
    form.commit_drop(ANALYTE_ENTITY, fx.analyte.public_id)
        .expect("drop analyte");
    form.commit_drop(RESULTS_ENTITY, fx.result.public_id)
        .expect("drop result");

    let order = Rc::new(RefCell::new(Vec::new()));
    let summaries = Rc::new(RefCell::new(Vec::new()));
    {
        let order = Rc::clone(&order);
        let summaries = Rc::clone(&summaries);
        fx.bus
            .subscribe(topic, EventKind::InterpretationAdded, move |event| {
                if let FormEvent::InterpretationAdded { summary } = event {
                    order.borrow_mut().push("interpretation");
                    summaries.borrow_mut().push(summary.clone());
                }
            });
    }
    {
        let order = Rc::clone(&order);
        fx.bus.subscribe(topic, EventKind::PanelClosed, move |_| {
            order.borrow_mut().push("closed")
        });
    }

    form.confirm();

    assert_eq!(*order.borrow(), vec!["interpretation", "closed"]);
    let summary = summaries.borrow()[0].clone();
    assert_eq!(summary.analyte.map(|e| e.nid), Some(Nid(1)));
    assert_eq!(summary.result.map(|e| e.nid), Some(Nid(2)));
    assert_eq!(summary.specimen, None);
}

#[test]
fn cancel_resets_form_and_publishes_panel_close() {
    let fx = Fixture::new();
    let topic = TopicKey::derive("details-t10");
    let form = fx.form(topic);
    form.commit_drop(ANALYTE_ENTITY, fx.analyte.public_id)
        .expect("drop");

    let closes = Rc::new(Cell::new(0u32));
    {
        let closes = Rc::clone(&closes);
        fx.bus.subscribe(topic, EventKind::PanelClosed, move |_| {
            closes.set(closes.get() + 1)
        });
    }

    form.cancel();

    assert!(form.view_model().borrow().is_empty_slot(ANALYTE_ENTITY));
    assert_eq!(closes.get(), 1);
}

#[test]
fn manual_entry_request_reaches_same_topic_subscribers() {
    let fx = Fixture::new();
    let topic = TopicKey::derive("details-t11");
    let form = fx.form(topic);

    let requests = Rc::new(Cell::new(0u32));
    {
        let requests = Rc::clone(&requests);
        fx.bus
            .subscribe(topic, EventKind::ManualEntryRequested, move |_| {
                requests.set(requests.get() + 1)
            });
    }

    form.request_manual_entry();
    assert_eq!(requests.get(), 1);
}

#[test]
fn edit_mode_window_derives_topic_from_entity() {
    let fx = Fixture::new();
    let window = fx.window(Some(fx.analyte.clone()));

    assert_eq!(
        window.details_topic(),
        TopicKey::for_entity_details(fx.analyte.nid)
    );
    assert_eq!(window.view_model().borrow().mode(), FormMode::Edit);
    assert_eq!(window.journal_topic(), TopicKey::derive("journal-main"));
    assert!(!window.is_create_mode());
    assert!(fx.registry.contains(window.details_topic()));
}

#[test]
fn reopening_an_entity_rejoins_the_same_topic() {
    let fx = Fixture::new();
    let mut first = fx.window(Some(fx.analyte.clone()));
    let topic = first.details_topic();
    first.close();

    let second = fx.window(Some(fx.analyte.clone()));
    assert_eq!(second.details_topic(), topic);
}

#[test]
fn create_mode_windows_use_distinct_topics() {
    let fx = Fixture::new();
    let first = fx.window(None);
    let second = fx.window(None);

    assert!(first.is_create_mode());
    assert_eq!(first.view_model().borrow().mode(), FormMode::Create);
    assert_ne!(first.details_topic(), second.details_topic());
    assert_eq!(fx.registry.len(), 2);
}

#[test]
fn duplicate_channel_registration_fails_window_open() {
    let fx = Fixture::new();
    let _first = fx.window(Some(fx.analyte.clone()));

    let second = ChapterWindow::open(
        TopicKey::derive("journal-main"),
        Some(fx.analyte.clone()),
        Rc::clone(&fx.bus),
        Rc::clone(&fx.registry),
        Rc::clone(&fx.resolver) as Rc<dyn directory::EntityResolver>,
        Rc::clone(&fx.store) as Rc<dyn Persistence>,
    );
    assert!(second.is_err(), "same entity twice means a topic collision");
}

#[test]
fn close_deregisters_channel_and_runs_hook_once() {
    let fx = Fixture::new();
    let mut window = fx.window(Some(fx.analyte.clone()));
    let topic = window.details_topic();

    let hook_runs = Rc::new(Cell::new(0u32));
    {
        let hook_runs = Rc::clone(&hook_runs);
        window.set_on_close(move || hook_runs.set(hook_runs.get() + 1));
    }

    window.close();
    assert_eq!(window.state(), WindowState::Closed);
    assert!(!fx.registry.contains(topic));
    assert_eq!(hook_runs.get(), 1);

    // Duplicate close is an idempotent no-op.
    window.close();
    assert_eq!(hook_runs.get(), 1);
    assert_eq!(window.state(), WindowState::Closed);
}

#[test]
fn window_form_is_bound_to_the_details_topic() {
    let fx = Fixture::new();
    let window = fx.window(None);
    let topic = window.details_topic();

    fx.bus.publish(
        topic,
        &FormEvent::ResultAddedToGroup {
            entity: fx.result.clone(),
        },
    );
    assert_eq!(
        window
            .view_model()
            .borrow()
            .get(RESULTS_ENTITY)
            .map(|e| e.nid),
        Some(Nid(2))
    );
    assert_eq!(window.kind(), WindowKind::Concept);
}
