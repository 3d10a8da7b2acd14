use std::{sync::Arc, time::Duration};

use shared::domain::SortOrder;

pub mod error;
pub mod mutation;
pub mod provenance;
pub mod render;
pub mod scheduler;
pub mod sort;
pub mod store;
pub mod transport;

#[cfg(test)]
#[path = "tests/fake_api.rs"]
pub(crate) mod fake_api;

pub use error::{MutationError, SyncError, ValidationError};
pub use mutation::{
    FeedbackKind, MutationCoordinator, MutationKind, MutationWorkflowState, Notice, WorkflowMode,
};
pub use provenance::{CacheProvenanceTracker, CacheStatus};
pub use render::{render, render_dashboard, Dashboard, RenderedEntry, RenderedView};
pub use scheduler::{SchedulerHandle, SyncScheduler, DEFAULT_POLL_INTERVAL};
pub use store::{EntrySnapshot, EntryStateStore, ListState, RefreshOrdering, StoreSnapshot};
pub use transport::{EntryApi, EntryListing, HttpEntryApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub sort_order: SortOrder,
    pub ordering: RefreshOrdering,
    pub poll_interval: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            sort_order: SortOrder::default(),
            ordering: RefreshOrdering::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Store, mutation coordinator and poller wired to one remote store.
pub struct SyncController {
    store: Arc<EntryStateStore>,
    coordinator: Arc<MutationCoordinator>,
    poll_interval: Duration,
}

impl SyncController {
    pub fn new(api: Arc<dyn EntryApi>, options: ControllerOptions) -> Self {
        let store = EntryStateStore::with_options(api.clone(), options.sort_order, options.ordering);
        let coordinator = MutationCoordinator::new(api, store.clone());
        Self {
            store,
            coordinator,
            poll_interval: options.poll_interval,
        }
    }

    pub fn store(&self) -> &Arc<EntryStateStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<MutationCoordinator> {
        &self.coordinator
    }

    /// Starts periodic refresh; polling stops when the handle is stopped or dropped.
    pub fn start_polling(&self) -> SchedulerHandle {
        SyncScheduler::new(self.store.clone(), self.poll_interval).start()
    }
}
