//! Chapter window lifecycle: one windowed presentation of a terminology
//! entity, owning a details channel registered for exactly the window's
//! lifetime.

use std::cell::RefCell;
use std::rc::Rc;

use directory::EntityResolver;
use eventbus::{EventBus, StreamRegistry};
use shared::domain::{EntityRef, WindowId};
use shared::error::StreamError;
use shared::topic::TopicKey;
use viewmodel::{FormMode, FormViewModel, Persistence};

use crate::form::AnalyteGroupForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Concept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Open,
    Closed,
}

pub struct ChapterWindow {
    window_id: WindowId,
    journal_topic: TopicKey,
    details_topic: TopicKey,
    subject: Option<EntityRef>,
    view_model: Rc<RefCell<FormViewModel>>,
    form: AnalyteGroupForm,
    registry: Rc<StreamRegistry>,
    state: WindowState,
    registration: Option<TopicKey>,
    on_close: Option<Box<dyn FnOnce()>>,
    property_panel_open: bool,
}

impl ChapterWindow {
    /// Opens a window onto `subject`, or a blank create-mode window when
    /// `subject` is `None`.
    ///
    /// The details topic is derived from the entity's nid in edit mode and
    /// from the window's own identity in create mode, so reopening an
    /// entity rejoins its channel while create-mode windows never collide.
    pub fn open(
        journal_topic: TopicKey,
        subject: Option<EntityRef>,
        bus: Rc<EventBus>,
        registry: Rc<StreamRegistry>,
        resolver: Rc<dyn EntityResolver>,
        store: Rc<dyn Persistence>,
    ) -> Result<Self, StreamError> {
        let window_id = WindowId::new();
        let label = match &subject {
            Some(entity) => format!("details-{}", entity.nid.0),
            None => format!("details-{}", window_id.0),
        };
        let details_topic = TopicKey::derive(&label);
        registry.create(details_topic, label.as_str())?;

        let mode = if subject.is_some() {
            FormMode::Edit
        } else {
            FormMode::Create
        };
        let view_model = Rc::new(RefCell::new(FormViewModel::new(mode, store)));
        let form = AnalyteGroupForm::new(details_topic, Rc::clone(&view_model), bus, resolver);

        tracing::info!(
            window = %window_id.0,
            topic = %details_topic,
            ?mode,
            "opened chapter window"
        );

        Ok(Self {
            window_id,
            journal_topic,
            details_topic,
            subject,
            view_model,
            form,
            registry,
            state: WindowState::Open,
            registration: Some(details_topic),
            on_close: None,
            property_panel_open: false,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn kind(&self) -> WindowKind {
        WindowKind::Concept
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn journal_topic(&self) -> TopicKey {
        self.journal_topic
    }

    pub fn details_topic(&self) -> TopicKey {
        self.details_topic
    }

    pub fn subject(&self) -> Option<&EntityRef> {
        self.subject.as_ref()
    }

    pub fn is_create_mode(&self) -> bool {
        self.subject.is_none()
    }

    pub fn form(&self) -> &AnalyteGroupForm {
        &self.form
    }

    pub fn view_model(&self) -> &Rc<RefCell<FormViewModel>> {
        &self.view_model
    }

    pub fn is_property_panel_open(&self) -> bool {
        self.property_panel_open
    }

    pub fn set_property_panel_open(&mut self, open: bool) {
        self.property_panel_open = open;
    }

    /// Registers a hook run once when the window closes, letting the
    /// owning workspace drop its reference.
    pub fn set_on_close(&mut self, hook: impl FnOnce() + 'static) {
        self.on_close = Some(Box::new(hook));
    }

    /// Closes the window: deregisters the details channel and runs the
    /// close hook, each exactly once. Duplicate calls are no-ops.
    pub fn close(&mut self) {
        let Some(key) = self.registration.take() else {
            tracing::debug!(window = %self.window_id.0, "duplicate close ignored");
            return;
        };
        if let Err(err) = self.registry.delete(key) {
            // Registration is owned by this window, so this indicates an
            // external delete of our channel.
            tracing::warn!(%key, %err, "details channel already gone on close");
        }
        self.state = WindowState::Closed;
        if let Some(hook) = self.on_close.take() {
            hook();
        }
        tracing::info!(window = %self.window_id.0, topic = %key, "closed chapter window");
    }
}
