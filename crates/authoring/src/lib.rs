//! Coordination core for the authoring workbench: the two-phase drop
//! protocol, the analyte group form controller, and the chapter window
//! lifecycle that owns a topic-scoped channel.

pub mod dragdrop;
pub mod form;
pub mod window;

pub use dragdrop::{DragPayload, DropOutcome, DropProposal, DropRejection};
pub use form::{AnalyteGroupForm, ANALYTE_ENTITY, RESULTS_ENTITY, SPECIMEN_ENTITY};
pub use window::{ChapterWindow, WindowKind, WindowState};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
