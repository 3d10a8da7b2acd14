//! Periodic refresh of entries, stats and health.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::store::EntryStateStore;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct SyncScheduler {
    store: Arc<EntryStateStore>,
    period: Duration,
}

impl SyncScheduler {
    pub fn new(store: Arc<EntryStateStore>, period: Duration) -> Self {
        Self { store, period }
    }

    /// Spawns the polling task. The first refresh fires immediately.
    ///
    /// Each tick runs its refresh on its own task, so a fetch that never
    /// resolves cannot hold back later ticks. Stopping prevents new ticks;
    /// refreshes already in flight run to completion.
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let Self { store, period } = self;
        info!(period_secs = period.as_secs_f64(), "sync scheduler started");

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks: u64 = 0;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }
                ticks += 1;
                debug!(tick = ticks, "scheduled refresh");
                let store = store.clone();
                tokio::spawn(async move {
                    store.refresh_all().await;
                });
            }
            info!(ticks, "sync scheduler stopped");
        });

        SchedulerHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Owns the polling task; dropping it stops polling.
pub struct SchedulerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_api::{sample_entry, FakeApi};

    #[tokio::test(start_paused = true)]
    async fn refreshes_immediately_then_every_period() {
        let api = Arc::new(FakeApi::new(vec![sample_entry(1, "ada", "hi", 0)]));
        let store = EntryStateStore::new(api.clone());
        let handle = SyncScheduler::new(store.clone(), DEFAULT_POLL_INTERVAL).start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.list_calls(), 1);
        assert_eq!(store.snapshot().entry_count, 1);
        assert!(store.snapshot().health.is_some());

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(api.list_calls(), 2);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 2).await;
        assert_eq!(api.list_calls(), 4);

        assert!(handle.is_running());
        handle.stop().await;
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;
        assert_eq!(api.list_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_polling() {
        let api = Arc::new(FakeApi::new(Vec::new()));
        let store = EntryStateStore::new(api.clone());
        let handle = SyncScheduler::new(store, Duration::from_secs(5)).start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(api.list_calls(), 1);
        drop(handle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_health_fetch_does_not_stall_polling() {
        let api = Arc::new(FakeApi::new(vec![sample_entry(1, "ada", "hi", 0)]));
        api.hang_health(true);
        let store = EntryStateStore::new(api.clone());
        let handle = SyncScheduler::new(store.clone(), DEFAULT_POLL_INTERVAL).start();

        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3 + Duration::from_secs(1)).await;
        assert_eq!(api.list_calls(), 4);
        assert_eq!(store.snapshot().entry_count, 1);
        assert_eq!(store.snapshot().stats.map(|s| s.total_entries()), Some(1));
        assert!(store.snapshot().health.is_none());

        tokio::time::timeout(Duration::from_secs(1), handle.stop())
            .await
            .expect("stop returns while a health fetch is still pending");
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 2).await;
        assert_eq!(api.list_calls(), 4);
    }
}
