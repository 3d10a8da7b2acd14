//! Client-side view of the entry collection and the status panels around it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Local};
use shared::{
    domain::{Entry, HealthStatus, SortOrder},
    protocol::{HealthResponse, StatsResponse},
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::SyncError,
    provenance::{CacheProvenanceTracker, CacheStatus},
    sort::sort_entries,
    transport::EntryApi,
};

/// How responses of overlapping list refreshes are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshOrdering {
    /// Whichever response resolves last overwrites the store.
    #[default]
    LastResolvedWins,
    /// Responses issued before the last applied one are discarded.
    LatestIssuedWins,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListState {
    #[default]
    NotLoaded,
    Loaded,
    Unreachable,
}

/// Result of one applied list refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub entries: Vec<Entry>,
    pub cache_status: CacheStatus,
    pub refreshed_at: Option<DateTime<Local>>,
    pub entry_count: usize,
}

/// Everything the renderer needs, published on every change.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub entries: Vec<Entry>,
    pub order: SortOrder,
    pub list_state: ListState,
    pub cache: CacheProvenanceTracker,
    pub last_refreshed: Option<DateTime<Local>>,
    pub entry_count: usize,
    /// `None` when the stats fetch failed or has not completed yet.
    pub stats: Option<StatsResponse>,
    pub health: Option<HealthStatus>,
    pub health_detail: Option<HealthResponse>,
    pub(crate) applied_token: u64,
}

impl StoreSnapshot {
    fn entry_snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            entries: self.entries.clone(),
            cache_status: self.cache.status(),
            refreshed_at: self.last_refreshed,
            entry_count: self.entry_count,
        }
    }
}

/// Outcome of a combined refresh; each part fails independently.
#[derive(Debug)]
pub struct RefreshReport {
    pub entries: Result<EntrySnapshot, SyncError>,
    pub stats: Option<Result<i64, SyncError>>,
    pub health: Option<Result<HealthStatus, SyncError>>,
}

pub struct EntryStateStore {
    api: Arc<dyn EntryApi>,
    ordering: RefreshOrdering,
    issued: AtomicU64,
    state: watch::Sender<StoreSnapshot>,
}

impl EntryStateStore {
    pub fn new(api: Arc<dyn EntryApi>) -> Arc<Self> {
        Self::with_options(api, SortOrder::default(), RefreshOrdering::default())
    }

    pub fn with_options(
        api: Arc<dyn EntryApi>,
        order: SortOrder,
        ordering: RefreshOrdering,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(StoreSnapshot {
            order,
            ..StoreSnapshot::default()
        });
        Arc::new(Self {
            api,
            ordering,
            issued: AtomicU64::new(0),
            state,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    fn accepts(&self, state: &StoreSnapshot, token: u64) -> bool {
        match self.ordering {
            RefreshOrdering::LastResolvedWins => true,
            RefreshOrdering::LatestIssuedWins => token > state.applied_token,
        }
    }

    /// Replaces the whole local collection with the remote list.
    ///
    /// On failure the previous entries stay in place, the list is marked
    /// unreachable and cache provenance falls back to unknown.
    pub async fn refresh(&self) -> Result<EntrySnapshot, SyncError> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(token, "refreshing entries");
        let result = self.api.list_entries().await;
        let now = Local::now();

        match result {
            Ok(listing) => {
                let mut entries = listing.entries;
                let mut applied = None;
                self.state.send_if_modified(|state| {
                    if !self.accepts(state, token) {
                        return false;
                    }
                    state.applied_token = token;
                    state.cache.record_at(listing.cache_marker.as_deref(), now);
                    sort_entries(&mut entries, state.order);
                    state.entries = entries;
                    state.entry_count = state.entries.len();
                    state.last_refreshed = Some(now);
                    state.list_state = ListState::Loaded;
                    applied = Some(state.entry_snapshot());
                    true
                });
                match applied {
                    Some(snapshot) => {
                        debug!(
                            token,
                            count = snapshot.entry_count,
                            cache = ?snapshot.cache_status,
                            "applied entry refresh"
                        );
                        Ok(snapshot)
                    }
                    None => {
                        debug!(token, "discarded superseded entry refresh");
                        Ok(self.state.borrow().entry_snapshot())
                    }
                }
            }
            Err(err) => {
                warn!(token, error = %err, "entry refresh failed");
                self.state.send_if_modified(|state| {
                    if !self.accepts(state, token) {
                        return false;
                    }
                    state.applied_token = token;
                    state.cache.reset();
                    state.list_state = ListState::Unreachable;
                    true
                });
                Err(err)
            }
        }
    }

    pub async fn refresh_stats(&self) -> Result<i64, SyncError> {
        match self.api.fetch_stats().await {
            Ok(stats) => {
                let total = stats.total_entries();
                self.state.send_modify(|state| state.stats = Some(stats));
                Ok(total)
            }
            Err(err) => {
                warn!(error = %err, "stats refresh failed");
                self.state.send_modify(|state| state.stats = None);
                Err(err)
            }
        }
    }

    pub async fn refresh_health(&self) -> Result<HealthStatus, SyncError> {
        match self.api.fetch_health().await {
            Ok(response) => {
                let status = HealthStatus::from_status(&response.status);
                self.state.send_modify(|state| {
                    state.health = Some(status);
                    state.health_detail = Some(response);
                });
                Ok(status)
            }
            Err(err) => {
                warn!(error = %err, "health refresh failed");
                self.state.send_modify(|state| {
                    state.health = Some(HealthStatus::Unhealthy);
                    state.health_detail = None;
                });
                Err(err)
            }
        }
    }

    /// Entries, stats and health, issued together; none aborts the others.
    pub async fn refresh_all(&self) -> RefreshReport {
        let (entries, stats, health) =
            futures::join!(self.refresh(), self.refresh_stats(), self.refresh_health());
        RefreshReport {
            entries,
            stats: Some(stats),
            health: Some(health),
        }
    }

    /// Refresh issued after a successful mutation: entries then stats.
    pub async fn refresh_after_mutation(&self) -> RefreshReport {
        let (entries, stats) = futures::join!(self.refresh(), self.refresh_stats());
        RefreshReport {
            entries,
            stats: Some(stats),
            health: None,
        }
    }

    /// Resorts the held entries without touching the network.
    pub fn set_sort_order(&self, order: SortOrder) {
        self.state.send_modify(|state| {
            state.order = order;
            sort_entries(&mut state.entries, order);
        });
        info!(%order, "sort order changed");
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
