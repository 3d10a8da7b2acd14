//! Create, update and delete workflows with confirmation gating.
//!
//! Delete and edit share one workflow slot: at most one of them can be open
//! at a time, and opening a second one while the slot is held is rejected
//! with [`MutationError::WorkflowBusy`]. Confirming a delete or submitting a
//! valid edit releases the slot before the network result is known.

use std::sync::Arc;

use shared::domain::{EntryDraft, EntryId};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::{MutationError, SyncError, ValidationError},
    store::EntryStateStore,
    transport::EntryApi,
};

const CREATE_REQUIRED: &str = "Identity and Message Payload required.";
const EDIT_REQUIRED: &str = "Identity and Message Payload cannot be empty.";
const CREATE_FAILED: &str = "Write failed. Entry was not saved.";
const UPDATE_FAILED: &str = "Could not update log entry.";
const DELETE_FAILED: &str = "Could not delete log entry.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowMode {
    None,
    ConfirmDelete,
    EditForm,
}

/// The single destructive/edit workflow slot. The target id exists exactly
/// when a workflow is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MutationWorkflowState {
    #[default]
    Idle,
    ConfirmDelete {
        target: EntryId,
    },
    EditForm {
        target: EntryId,
        draft: EntryDraft,
    },
}

impl MutationWorkflowState {
    pub fn mode(&self) -> WorkflowMode {
        match self {
            MutationWorkflowState::Idle => WorkflowMode::None,
            MutationWorkflowState::ConfirmDelete { .. } => WorkflowMode::ConfirmDelete,
            MutationWorkflowState::EditForm { .. } => WorkflowMode::EditForm,
        }
    }

    pub fn target(&self) -> Option<EntryId> {
        match self {
            MutationWorkflowState::Idle => None,
            MutationWorkflowState::ConfirmDelete { target }
            | MutationWorkflowState::EditForm { target, .. } => Some(*target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// Cue attached to every notice, standing in for the icon and sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Update,
    Delete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Created,
    Updated { id: EntryId },
    Deleted { id: EntryId },
    ValidationFailed { kind: MutationKind },
    TransportFailed { kind: MutationKind },
}

impl Notice {
    pub fn feedback(&self) -> FeedbackKind {
        match self {
            Notice::Created => FeedbackKind::Success,
            Notice::Updated { .. } => FeedbackKind::Update,
            Notice::Deleted { .. } => FeedbackKind::Delete,
            Notice::ValidationFailed { .. } | Notice::TransportFailed { .. } => {
                FeedbackKind::Error
            }
        }
    }

    /// Validation notices block until dismissed; the rest are one-shot.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Notice::ValidationFailed { .. })
    }

    pub fn text(&self) -> Option<&'static str> {
        match self {
            Notice::Created | Notice::Updated { .. } | Notice::Deleted { .. } => None,
            Notice::ValidationFailed { kind: MutationKind::Create } => Some(CREATE_REQUIRED),
            Notice::ValidationFailed { .. } => Some(EDIT_REQUIRED),
            Notice::TransportFailed { kind } => Some(match kind {
                MutationKind::Create => CREATE_FAILED,
                MutationKind::Update => UPDATE_FAILED,
                MutationKind::Delete => DELETE_FAILED,
            }),
        }
    }
}

pub struct MutationCoordinator {
    api: Arc<dyn EntryApi>,
    store: Arc<EntryStateStore>,
    workflow: Mutex<MutationWorkflowState>,
    create_form: Mutex<EntryDraft>,
    notices: broadcast::Sender<Notice>,
}

impl MutationCoordinator {
    pub fn new(api: Arc<dyn EntryApi>, store: Arc<EntryStateStore>) -> Arc<Self> {
        let (notices, _) = broadcast::channel(64);
        Arc::new(Self {
            api,
            store,
            workflow: Mutex::new(MutationWorkflowState::Idle),
            create_form: Mutex::new(EntryDraft::default()),
            notices,
        })
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub async fn workflow(&self) -> MutationWorkflowState {
        self.workflow.lock().await.clone()
    }

    pub async fn create_form(&self) -> EntryDraft {
        self.create_form.lock().await.clone()
    }

    pub async fn set_create_form(&self, draft: EntryDraft) {
        *self.create_form.lock().await = draft;
    }

    fn emit(&self, notice: Notice) {
        debug!(?notice, "mutation notice");
        // No subscribers is fine; notices are fire-and-forget.
        let _ = self.notices.send(notice);
    }

    async fn resync(&self) {
        let report = self.store.refresh_after_mutation().await;
        if let Err(err) = report.entries {
            debug!(error = %err, "post-mutation refresh failed");
        }
    }

    /// Validates and submits the create form. The form is cleared only on
    /// success.
    pub async fn submit_create(&self) -> Result<(), MutationError> {
        let draft = self.create_form.lock().await.clone();
        let Some(draft) = draft.normalized() else {
            self.emit(Notice::ValidationFailed {
                kind: MutationKind::Create,
            });
            return Err(ValidationError::MissingField.into());
        };

        if let Err(err) = self.api.create_entry(&draft).await {
            warn!(status = ?err.status(), error = %err, "create entry failed");
            self.emit(Notice::TransportFailed {
                kind: MutationKind::Create,
            });
            return Err(err.into());
        }

        self.create_form.lock().await.clear();
        info!(name = %draft.name, "entry created");
        self.emit(Notice::Created);
        self.resync().await;
        Ok(())
    }

    async fn acquire(&self, next: MutationWorkflowState) -> Result<(), MutationError> {
        let mut slot = self.workflow.lock().await;
        if let Some(target) = slot.target() {
            let active = slot.mode();
            warn!(?active, %target, requested = ?next.mode(), "workflow slot busy");
            return Err(MutationError::WorkflowBusy { active, target });
        }
        debug!(mode = ?next.mode(), target = ?next.target(), "workflow opened");
        *slot = next;
        Ok(())
    }

    /// Opens the delete confirmation for an entry taken from the rendered list.
    pub async fn open_delete(&self, id: EntryId) -> Result<(), MutationError> {
        self.acquire(MutationWorkflowState::ConfirmDelete { target: id })
            .await
    }

    /// Opens the edit form pre-filled with the values currently on display.
    pub async fn open_edit(&self, id: EntryId, current: EntryDraft) -> Result<(), MutationError> {
        self.acquire(MutationWorkflowState::EditForm {
            target: id,
            draft: current,
        })
        .await
    }

    pub async fn set_edit_fields(&self, fields: EntryDraft) -> Result<(), MutationError> {
        let mut slot = self.workflow.lock().await;
        match &mut *slot {
            MutationWorkflowState::EditForm { draft, .. } => {
                *draft = fields;
                Ok(())
            }
            _ => Err(MutationError::NoActiveWorkflow {
                expected: WorkflowMode::EditForm,
            }),
        }
    }

    /// Closes whichever surface is open without touching the network.
    pub async fn cancel(&self) -> WorkflowMode {
        let mut slot = self.workflow.lock().await;
        let closed = slot.mode();
        *slot = MutationWorkflowState::Idle;
        if closed != WorkflowMode::None {
            debug!(?closed, "workflow cancelled");
        }
        closed
    }

    pub async fn confirm_delete(&self) -> Result<(), MutationError> {
        let target = {
            let mut slot = self.workflow.lock().await;
            let MutationWorkflowState::ConfirmDelete { target } = *slot else {
                return Err(MutationError::NoActiveWorkflow {
                    expected: WorkflowMode::ConfirmDelete,
                });
            };
            *slot = MutationWorkflowState::Idle;
            target
        };

        match self.api.delete_entry(target).await {
            Ok(()) => {
                info!(entry_id = %target, "entry deleted");
                self.emit(Notice::Deleted { id: target });
                self.resync().await;
                Ok(())
            }
            Err(err) => self.fail(MutationKind::Delete, target, err),
        }
    }

    /// Submits the edit form. A validation failure keeps the form open; a
    /// valid submission closes it before the network result is known.
    pub async fn submit_edit(&self) -> Result<(), MutationError> {
        let (target, draft) = {
            let mut slot = self.workflow.lock().await;
            let MutationWorkflowState::EditForm { target, draft } = &*slot else {
                return Err(MutationError::NoActiveWorkflow {
                    expected: WorkflowMode::EditForm,
                });
            };
            let target = *target;
            let Some(draft) = draft.normalized() else {
                drop(slot);
                self.emit(Notice::ValidationFailed {
                    kind: MutationKind::Update,
                });
                return Err(ValidationError::MissingField.into());
            };
            *slot = MutationWorkflowState::Idle;
            (target, draft)
        };

        match self.api.update_entry(target, &draft).await {
            Ok(()) => {
                info!(entry_id = %target, "entry updated");
                self.emit(Notice::Updated { id: target });
                self.resync().await;
                Ok(())
            }
            Err(err) => self.fail(MutationKind::Update, target, err),
        }
    }

    fn fail(&self, kind: MutationKind, target: EntryId, err: SyncError) -> Result<(), MutationError> {
        warn!(entry_id = %target, ?kind, status = ?err.status(), error = %err, "mutation failed");
        self.emit(Notice::TransportFailed { kind });
        Err(err.into())
    }
}

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod tests;
