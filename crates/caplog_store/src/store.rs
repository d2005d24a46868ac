//! The reactive record store.
//!
//! Holds the authenticated user's daily records in memory, mirrors backend
//! change events into full replacement snapshots, and applies the workspace's
//! one deliberate retry policy on the create path. Snapshots and derived
//! state travel through `watch` channels: only the latest value is retained,
//! intermediate states may be dropped (snapshots are idempotent full
//! replacements, not deltas).

use std::sync::Arc;

use caplog_common::models::{
    DailyRecord, DailyRecordPatch, NewDailyRecord, Session, SyncStatus,
};
use caplog_common::services::{DailyRecordRepository, GatewayFactory, RealtimeService};
use caplog_common::{validation_error, CaplogError};
use chrono::{NaiveDate, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::stats::{self, ProgressStats};

/// Store tuning derived from the application configuration.
#[derive(Debug, Clone)]
pub struct StoreTuning {
    /// Delay before the single automatic retry of a failed create.
    pub create_retry_delay: std::time::Duration,
}

impl StoreTuning {
    pub fn from_config(config: &caplog_config::AppConfig) -> Self {
        Self {
            create_retry_delay: std::time::Duration::from_millis(
                config.retry.create_retry_delay_ms,
            ),
        }
    }
}

impl Default for StoreTuning {
    fn default() -> Self {
        Self {
            create_retry_delay: std::time::Duration::from_secs(2),
        }
    }
}

struct StoreInner {
    user_id: String,
    records: caplog_common::services::DynDailyRecords,
    tuning: StoreTuning,
    snapshot_tx: watch::Sender<Arc<Vec<DailyRecord>>>,
    stats_tx: watch::Sender<ProgressStats>,
    status_tx: watch::Sender<SyncStatus>,
}

impl StoreInner {
    /// Replace the snapshot wholesale and recompute the derived aggregates.
    fn publish(&self, records: Vec<DailyRecord>) {
        let snapshot = Arc::new(records);
        self.stats_tx
            .send_replace(stats::compute(&snapshot, Utc::now().date_naive()));
        self.snapshot_tx.send_replace(snapshot);
    }

    /// Re-fetch the complete record set and publish it.
    async fn refresh(&self) -> Result<(), CaplogError> {
        let records = self.records.list(&self.user_id).await?;
        self.publish(records);
        Ok(())
    }
}

/// A live feed of full replacement snapshots.
///
/// Dropping the handle detaches the upstream subscription; in-flight
/// mutations are not cancelled, only the feed task stops.
pub struct RecordsFeed {
    rx: watch::Receiver<Arc<Vec<DailyRecord>>>,
    task: JoinHandle<()>,
}

impl RecordsFeed {
    /// Wait until the next snapshot replacement and return it.
    /// `None` means the store side has gone away.
    pub async fn next_snapshot(&mut self) -> Option<Arc<Vec<DailyRecord>>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> Arc<Vec<DailyRecord>> {
        self.rx.borrow().clone()
    }
}

impl Drop for RecordsFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Reactive cache of one user's daily records.
pub struct RecordStore {
    inner: Arc<StoreInner>,
    realtime: caplog_common::services::DynRealtime,
}

impl RecordStore {
    /// Build a store for the session's user over the given gateway.
    pub fn new(gateway: &dyn GatewayFactory, session: &Session, tuning: StoreTuning) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (stats_tx, _) = watch::channel(ProgressStats::default());
        let (status_tx, _) = watch::channel(SyncStatus::Synced);

        Self {
            inner: Arc::new(StoreInner {
                user_id: session.user.id.clone(),
                records: gateway.daily_records(session),
                tuning,
                snapshot_tx,
                stats_tx,
                status_tx,
            }),
            realtime: gateway.realtime(session),
        }
    }

    /// The current in-memory snapshot.
    pub fn records(&self) -> Arc<Vec<DailyRecord>> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// The latest derived aggregates.
    pub fn progress(&self) -> ProgressStats {
        self.inner.stats_tx.borrow().clone()
    }

    /// Watch channel of derived aggregates, recomputed per snapshot.
    pub fn progress_feed(&self) -> watch::Receiver<ProgressStats> {
        self.inner.stats_tx.subscribe()
    }

    /// Advisory outcome of the last mutating operation.
    pub fn sync_status(&self) -> SyncStatus {
        *self.inner.status_tx.borrow()
    }

    /// Watch channel of the advisory sync status.
    pub fn status_feed(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Fetch the full record set once and publish it as the new snapshot.
    pub async fn refresh(&self) -> Result<(), CaplogError> {
        self.inner.refresh().await
    }

    /// Establish the live feed: one eager full fetch, then a full re-fetch on
    /// every upstream change event.
    pub async fn subscribe(&self) -> Result<RecordsFeed, CaplogError> {
        self.inner.refresh().await?;

        let mut subscription = self.realtime.subscribe(&self.inner.user_id).await?;
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            while subscription.next_event().await.is_some() {
                if let Err(e) = inner.refresh().await {
                    warn!(error = %e, "snapshot re-fetch after change event failed");
                }
            }
        });

        Ok(RecordsFeed {
            rx: self.inner.snapshot_tx.subscribe(),
            task,
        })
    }

    /// Create a record.
    ///
    /// A transport failure is retried exactly once after the configured delay
    /// and the caller awaits the retry outcome. A domain conflict (the
    /// backend's per-day uniqueness firing) is final immediately. After a
    /// successful write the store performs a best-effort verification read;
    /// the backend may be eventually consistent on that path, so a miss is
    /// only worth a warning.
    pub async fn create(&self, record: NewDailyRecord) -> Result<DailyRecord, CaplogError> {
        if record.user_id != self.inner.user_id {
            return Err(validation_error("record does not belong to this session"));
        }

        self.inner.status_tx.send_replace(SyncStatus::Syncing);

        let result = match self.inner.records.create(record.clone()).await {
            Ok(created) => Ok(created),
            Err(first) if first.is_retryable() => {
                warn!(error = %first, date = %record.date, "create failed; retrying once");
                tokio::time::sleep(self.inner.tuning.create_retry_delay).await;
                self.inner.records.create(record).await.map_err(|second| {
                    error!(error = %second, "create failed again after retry");
                    second
                })
            }
            Err(first) => Err(first),
        };

        match result {
            Ok(created) => {
                self.inner.status_tx.send_replace(SyncStatus::Synced);
                self.verify_visible(created.date).await;
                info!(id = %created.id, date = %created.date, "record created");
                Ok(created)
            }
            Err(e) => {
                self.inner.status_tx.send_replace(SyncStatus::Error);
                Err(e)
            }
        }
    }

    async fn verify_visible(&self, date: NaiveDate) {
        match self
            .inner
            .records
            .find_by_date(&self.inner.user_id, date)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => warn!(%date, "created record not yet visible on verification read"),
            Err(e) => warn!(%date, error = %e, "verification read failed"),
        }
    }

    /// Partially update a record. The backend echoes the written row, which
    /// doubles as the read-your-writes acknowledgment; no settle delay.
    pub async fn update(
        &self,
        id: &str,
        patch: DailyRecordPatch,
    ) -> Result<DailyRecord, CaplogError> {
        self.inner.status_tx.send_replace(SyncStatus::Syncing);
        match self.inner.records.update(id, patch).await {
            Ok(updated) => {
                self.inner.status_tx.send_replace(SyncStatus::Synced);
                Ok(updated)
            }
            Err(e) => {
                self.inner.status_tx.send_replace(SyncStatus::Error);
                Err(e)
            }
        }
    }

    /// Delete a record.
    pub async fn remove(&self, id: &str) -> Result<(), CaplogError> {
        self.inner.status_tx.send_replace(SyncStatus::Syncing);
        match self.inner.records.delete(id).await {
            Ok(()) => {
                self.inner.status_tx.send_replace(SyncStatus::Synced);
                Ok(())
            }
            Err(e) => {
                self.inner.status_tx.send_replace(SyncStatus::Error);
                Err(e)
            }
        }
    }

    /// Look up the record for one calendar date.
    ///
    /// Served from the snapshot when present, otherwise one direct backend
    /// lookup. Absence is `None`, never an error; a failed lookup is logged
    /// and swallowed.
    pub async fn find_by_date(&self, date: NaiveDate) -> Option<DailyRecord> {
        if let Some(record) = self.records().iter().find(|r| r.date == date) {
            return Some(record.clone());
        }

        match self
            .inner
            .records
            .find_by_date(&self.inner.user_id, date)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(%date, error = %e, "record lookup failed; treating as absent");
                None
            }
        }
    }
}
