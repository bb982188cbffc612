use std::{
    cell::RefCell,
    collections::HashMap,
    path::PathBuf,
    rc::Rc,
};

use authoring::{
    ChapterWindow, DragPayload, DropOutcome, DropProposal, DropRejection, WindowState,
    ANALYTE_ENTITY, RESULTS_ENTITY, SPECIMEN_ENTITY,
};
use directory::{EntityDirectory, EntityResolver};
use eframe::egui;
use eventbus::{EventBus, StreamRegistry, SubscriptionId};
use shared::domain::{EntityKind, EntityRef, PublicId, WindowId};
use shared::events::{EventKind, FormEvent, InterpretationSummary};
use shared::topic::TopicKey;
use uuid::Uuid;
use viewmodel::{FormMode, Persistence, SlotKey};

use crate::config::Settings;
use crate::persist::DraftStore;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_root: PathBuf,
    pub drafts_dir: PathBuf,
}

impl AppPaths {
    pub fn resolve(data_dir: Option<&PathBuf>) -> anyhow::Result<Self> {
        let root = if let Some(dir) = data_dir {
            dir.clone()
        } else {
            let base = dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("unable to resolve local app data dir"))?;
            base.join("terminology_workbench")
        };
        Ok(Self {
            drafts_dir: root.join("drafts"),
            data_root: root,
        })
    }
}

/// Per-window panel visibility, toggled through bus events so that other
/// panels under the same topic can drive it.
#[derive(Debug, Clone, Copy)]
struct PanelFlags {
    properties_open: bool,
    manual_entry_open: bool,
}

struct JournalEntry {
    topic: TopicKey,
    summary: InterpretationSummary,
}

struct WindowShell {
    window: ChapterWindow,
    keep_open: bool,
    subs: Vec<(EventKind, SubscriptionId)>,
}

pub struct WorkbenchApp {
    bus: Rc<EventBus>,
    registry: Rc<StreamRegistry>,
    directory: Rc<EntityDirectory>,
    drafts_dir: PathBuf,
    journal_topic: TopicKey,
    palette: Vec<EntityRef>,
    shells: Vec<WindowShell>,
    panel_flags: Rc<RefCell<HashMap<TopicKey, PanelFlags>>>,
    journal: Rc<RefCell<Vec<JournalEntry>>>,
    status: String,
}

impl WorkbenchApp {
    pub fn new(_settings: &Settings, directory: EntityDirectory, paths: AppPaths) -> Self {
        let palette = directory.all();
        // One journal channel per application session.
        let journal_topic = TopicKey::derive(&format!("journal-{}", WindowId::new().0));
        Self {
            bus: Rc::new(EventBus::new()),
            registry: Rc::new(StreamRegistry::new()),
            directory: Rc::new(directory),
            drafts_dir: paths.drafts_dir,
            journal_topic,
            palette,
            shells: Vec::new(),
            panel_flags: Rc::new(RefCell::new(HashMap::new())),
            journal: Rc::new(RefCell::new(Vec::new())),
            status: "Drag concepts from the palette into a chapter window".to_string(),
        }
    }

    fn open_window(&mut self, subject: Option<EntityRef>) {
        // One draft file per window: edit-mode drafts follow the entity's
        // details topic, create-mode drafts get a fresh identity.
        let draft_name = match &subject {
            Some(entity) => format!("draft-{}.json", TopicKey::for_entity_details(entity.nid)),
            None => format!("draft-{}.json", Uuid::new_v4()),
        };
        let store = match DraftStore::new(self.drafts_dir.clone(), draft_name) {
            Ok(store) => Rc::new(store),
            Err(err) => {
                self.status = format!("Cannot prepare draft store: {err}");
                return;
            }
        };

        let opened = ChapterWindow::open(
            self.journal_topic,
            subject,
            Rc::clone(&self.bus),
            Rc::clone(&self.registry),
            Rc::clone(&self.directory) as Rc<dyn EntityResolver>,
            store as Rc<dyn Persistence>,
        );
        let mut window = match opened {
            Ok(window) => window,
            Err(err) => {
                self.status = format!("Cannot open window: {err}");
                return;
            }
        };

        let topic = window.details_topic();
        self.panel_flags.borrow_mut().insert(
            topic,
            PanelFlags {
                properties_open: true,
                manual_entry_open: false,
            },
        );

        let mut subs = Vec::new();
        {
            let flags = Rc::clone(&self.panel_flags);
            let id = self.bus.subscribe(topic, EventKind::PanelClosed, move |_| {
                if let Some(entry) = flags.borrow_mut().get_mut(&topic) {
                    entry.properties_open = false;
                    entry.manual_entry_open = false;
                }
            });
            subs.push((EventKind::PanelClosed, id));
        }
        {
            let flags = Rc::clone(&self.panel_flags);
            let id = self
                .bus
                .subscribe(topic, EventKind::ManualEntryRequested, move |_| {
                    if let Some(entry) = flags.borrow_mut().get_mut(&topic) {
                        entry.manual_entry_open = true;
                    }
                });
            subs.push((EventKind::ManualEntryRequested, id));
        }
        {
            let journal = Rc::clone(&self.journal);
            let id = self
                .bus
                .subscribe(topic, EventKind::InterpretationAdded, move |event| {
                    if let FormEvent::InterpretationAdded { summary } = event {
                        journal.borrow_mut().push(JournalEntry {
                            topic,
                            summary: summary.clone(),
                        });
                    }
                });
            subs.push((EventKind::InterpretationAdded, id));
        }

        window.set_on_close(move || {
            tracing::debug!(%topic, "workspace notified of window close");
        });
        window.set_property_panel_open(true);

        self.shells.push(WindowShell {
            window,
            keep_open: true,
            subs,
        });
    }

    fn teardown(&self, shell: &mut WindowShell) {
        let topic = shell.window.details_topic();
        shell.window.close();
        for (kind, id) in shell.subs.drain(..) {
            self.bus.unsubscribe(topic, kind, id);
        }
        self.panel_flags.borrow_mut().remove(&topic);
    }

    fn palette_panel(&mut self, ctx: &egui::Context) {
        let mut open_subject: Option<Option<EntityRef>> = None;

        egui::SidePanel::left("palette").show(ctx, |ui| {
            ui.heading("Concept palette");
            ui.separator();
            if ui.button("New concept window").clicked() {
                open_subject = Some(None);
            }
            ui.separator();
            for entity in &self.palette {
                ui.horizontal(|ui| {
                    let id = egui::Id::new(("palette", entity.nid.0));
                    ui.dnd_drag_source(id, entity.public_id, |ui| {
                        let tag = match entity.kind {
                            EntityKind::Concept => "•",
                            EntityKind::ComponentSet => "▣",
                        };
                        ui.label(format!("{tag} {}", entity.description));
                    });
                    if ui.small_button("Open").clicked() {
                        open_subject = Some(Some(entity.clone()));
                    }
                });
            }
        });

        if let Some(subject) = open_subject {
            self.open_window(subject);
        }
    }

    fn journal_panel(&self, ctx: &egui::Context) {
        egui::SidePanel::right("journal").show(ctx, |ui| {
            ui.heading("Journal");
            ui.separator();
            for entry in self.journal.borrow().iter().rev() {
                let describe = |slot: &Option<EntityRef>| {
                    slot.as_ref()
                        .map(|e| e.description.as_str())
                        .unwrap_or("—")
                        .to_string()
                };
                ui.label(format!(
                    "[{}] {} / {} / {}",
                    entry.summary.recorded_at.format("%H:%M:%S"),
                    describe(&entry.summary.analyte),
                    describe(&entry.summary.result),
                    describe(&entry.summary.specimen),
                ));
                ui.small(format!("topic {}", entry.topic));
                ui.separator();
            }
        });
    }

    fn slot_row(
        shell: &WindowShell,
        ui: &mut egui::Ui,
        slot: SlotKey,
        label: &str,
        status: &mut Vec<String>,
    ) {
        let form = shell.window.form();
        ui.horizontal(|ui| {
            ui.label(label);
            let frame = egui::Frame::group(ui.style());
            let (_, dropped) = ui.dnd_drop_zone::<PublicId, ()>(frame, |ui| {
                match form.view_model().borrow().get(slot) {
                    Some(entity) => {
                        ui.label(&entity.description);
                    }
                    None => {
                        ui.weak("drop a concept here");
                    }
                }
            });
            if let Some(public_id) = dropped {
                let payload = DragPayload::EntityIdentity(*public_id);
                match form.propose_drop(slot, &payload) {
                    DropProposal::Accepted(public_id) => {
                        match form.commit_drop(slot, public_id) {
                            Ok(DropOutcome::Committed(entity)) => {
                                status.push(format!("Added {}", entity.description));
                            }
                            Ok(DropOutcome::Ignored) => {}
                            Err(err) => status.push(format!("Drop failed: {err}")),
                        }
                    }
                    DropProposal::Rejected(DropRejection::SlotOccupied) => {
                        status.push(format!("{label} already has a value"));
                    }
                    DropProposal::Rejected(DropRejection::NotAnEntity) => {}
                }
            }
            if form.view_model().borrow().get(slot).is_some() && ui.small_button("✕").clicked()
            {
                form.clear_slot(slot);
            }
        });
    }

    fn show_window(&self, ctx: &egui::Context, shell: &mut WindowShell, status: &mut Vec<String>) {
        let topic = shell.window.details_topic();
        let title = match shell.window.subject() {
            Some(entity) => entity.description.clone(),
            None => "New concept".to_string(),
        };
        let mode = shell.window.view_model().borrow().mode();
        let flags = self
            .panel_flags
            .borrow()
            .get(&topic)
            .copied()
            .unwrap_or(PanelFlags {
                properties_open: false,
                manual_entry_open: false,
            });

        let mut keep_open = shell.keep_open;
        egui::Window::new(title)
            .id(egui::Id::new(("chapter", shell.window.window_id().0)))
            .open(&mut keep_open)
            .show(ctx, |ui| {
                match mode {
                    FormMode::Create => ui.small("create mode"),
                    FormMode::Edit => ui.small("edit mode"),
                };
                ui.separator();

                if flags.properties_open {
                    Self::slot_row(shell, ui, ANALYTE_ENTITY, "Analyte", status);
                    Self::slot_row(shell, ui, RESULTS_ENTITY, "Result", status);
                    Self::slot_row(shell, ui, SPECIMEN_ENTITY, "Specimen", status);

                    ui.separator();
                    ui.horizontal(|ui| {
                        let form = shell.window.form();
                        if ui.button("Manual entry…").clicked() {
                            form.request_manual_entry();
                        }
                        if ui.button("Clear").clicked() {
                            form.clear_form();
                        }
                        if ui.button("Cancel").clicked() {
                            form.cancel();
                        }
                        if ui.button("Done").clicked() {
                            form.confirm();
                        }
                    });

                    if flags.manual_entry_open {
                        ui.separator();
                        ui.label("Manual result entry");
                        for entity in &self.palette {
                            if ui.small_button(&entity.description).clicked() {
                                self.bus.publish(
                                    topic,
                                    &FormEvent::ResultAddedToGroup {
                                        entity: entity.clone(),
                                    },
                                );
                                if let Some(entry) =
                                    self.panel_flags.borrow_mut().get_mut(&topic)
                                {
                                    entry.manual_entry_open = false;
                                }
                            }
                        }
                    }
                } else if ui.button("Reopen properties panel").clicked() {
                    if let Some(entry) = self.panel_flags.borrow_mut().get_mut(&topic) {
                        entry.properties_open = true;
                    }
                }
            });
        shell.keep_open = keep_open;
        shell
            .window
            .set_property_panel_open(flags.properties_open);
    }
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.palette_panel(ctx);
        self.journal_panel(ctx);

        let mut status_updates = Vec::new();
        let mut shells = std::mem::take(&mut self.shells);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(&self.status);
            if shells.is_empty() {
                ui.weak("No chapter windows open.");
            }
        });

        for shell in &mut shells {
            self.show_window(ctx, shell, &mut status_updates);
        }
        for shell in &mut shells {
            if !shell.keep_open && shell.window.state() == WindowState::Open {
                self.teardown(shell);
            }
        }
        shells.retain(|shell| shell.window.state() == WindowState::Open);
        self.shells = shells;

        if let Some(last) = status_updates.pop() {
            self.status = last;
        }
    }
}
