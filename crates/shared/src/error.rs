use thiserror::Error;

use crate::domain::{Nid, PublicId};
use crate::topic::TopicKey;

/// Entity directory lookup failures. A failed lookup aborts the operation
/// that needed it; no partial state is left behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("no entity registered for public id {0}")]
    UnknownIdentity(PublicId),
    #[error("no entity registered for nid {0}")]
    UnknownRef(Nid),
}

/// Activity-stream registry lifecycle violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("activity stream already registered for topic {0}")]
    AlreadyRegistered(TopicKey),
    #[error("no activity stream registered for topic {0}")]
    NotRegistered(TopicKey),
}

/// View-model persistence failure.
#[derive(Debug, Clone, Error)]
#[error("save failed: {message}")]
pub struct SaveError {
    pub message: String,
}

impl SaveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure while committing a drop gesture.
#[derive(Debug, Error)]
pub enum DropError {
    #[error(transparent)]
    Lookup(#[from] DirectoryError),
    #[error(transparent)]
    Save(#[from] SaveError),
}
