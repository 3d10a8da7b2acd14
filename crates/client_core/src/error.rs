use shared::{domain::EntryId, error::ApiError};
use thiserror::Error;

use crate::mutation::WorkflowMode;

/// Failure of a single round-trip to the remote store.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server responded {}: {}", .0.status, .0.message)]
    Status(ApiError),
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl SyncError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Status(api) => Some(api.status),
            SyncError::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name and message are required")]
    MissingField,
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("mutation transport failed: {0}")]
    Transport(#[from] SyncError),
    #[error("another {active:?} workflow is active for entry {target}")]
    WorkflowBusy { active: WorkflowMode, target: EntryId },
    #[error("no {expected:?} workflow is active")]
    NoActiveWorkflow { expected: WorkflowMode },
}

impl MutationError {
    pub fn is_validation(&self) -> bool {
        matches!(self, MutationError::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, MutationError::Transport(_))
    }
}
