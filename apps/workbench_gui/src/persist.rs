//! Draft persistence for form view-models: each save writes the current
//! snapshot as JSON under the per-user drafts directory. Every window gets
//! its own draft file, keyed by its details topic, so concurrent chapter
//! windows never overwrite each other's drafts.

use std::{fs, path::PathBuf};

use shared::error::SaveError;
use viewmodel::{FormSnapshot, Persistence};

pub struct DraftStore {
    draft_path: PathBuf,
}

impl DraftStore {
    pub fn new(drafts_dir: PathBuf, file_name: impl Into<String>) -> Result<Self, SaveError> {
        fs::create_dir_all(&drafts_dir)
            .map_err(|err| SaveError::new(format!("cannot create drafts dir: {err}")))?;
        Ok(Self {
            draft_path: drafts_dir.join(file_name.into()),
        })
    }
}

impl Persistence for DraftStore {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), SaveError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|err| SaveError::new(format!("cannot serialize draft: {err}")))?;
        fs::write(&self.draft_path, json).map_err(|err| {
            SaveError::new(format!("cannot write {}: {err}", self.draft_path.display()))
        })?;
        tracing::debug!(path = %self.draft_path.display(), "saved form draft");
        Ok(())
    }
}
