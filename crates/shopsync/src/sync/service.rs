//! Public entry point for launching and observing sync runs.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::platform::{ClientFactory, PlatformError, RateLimiterRegistry};
use crate::repository::RepositoryError;
use crate::store::CatalogStore;

use super::engine;
use super::progress::{ProgressSnapshot, ProgressStore, RunStatus};
use super::types::{StartedSync, SyncOptions};

/// Errors surfaced to callers of [`SyncService`].
///
/// Per-product and per-batch failures never appear here; they are folded
/// into the run's error counter. These are the failures that prevent a run
/// from starting or from being set up at all.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no products requested for sync")]
    EmptyRequest,

    #[error("none of the requested products exist")]
    NoTargets,

    #[error("connection {0} not found")]
    ConnectionNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] RepositoryError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Launches sync runs and answers progress polls.
///
/// One service instance is long-lived and shared; each [`start_sync`] call
/// spawns an independent run identified by the returned progress key.
///
/// [`start_sync`]: SyncService::start_sync
pub struct SyncService {
    store: Arc<dyn CatalogStore>,
    clients: Arc<dyn ClientFactory>,
    progress: Arc<ProgressStore>,
    limiters: Arc<RateLimiterRegistry>,
    options: SyncOptions,
}

impl SyncService {
    pub fn new(store: Arc<dyn CatalogStore>, clients: Arc<dyn ClientFactory>) -> Self {
        Self::with_options(store, clients, SyncOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn CatalogStore>,
        clients: Arc<dyn ClientFactory>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            clients,
            progress: Arc::new(ProgressStore::new()),
            limiters: Arc::new(RateLimiterRegistry::new()),
            options,
        }
    }

    /// The shared progress store, for callers that want direct access.
    pub fn progress_store(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    /// Start a sync run for the given local product row ids.
    ///
    /// Resolves the ids to sync targets, registers a progress record, and
    /// spawns the run in the background. Returns immediately with the key
    /// to poll. Ids that match no row are dropped; if nothing resolves the
    /// run is refused with [`SyncError::NoTargets`].
    pub async fn start_sync(&self, product_ids: Vec<Uuid>) -> Result<StartedSync, SyncError> {
        if product_ids.is_empty() {
            return Err(SyncError::EmptyRequest);
        }
        let targets = self.store.list_sync_targets(&product_ids).await?;
        if targets.is_empty() {
            return Err(SyncError::NoTargets);
        }

        // Lazy retention: evict stale finished runs whenever a new one starts.
        self.progress.sweep(self.options.retention);

        let key = Uuid::new_v4();
        let total = targets.len() as u64;
        self.progress.create(key, total);
        info!(key = %key, total, "sync run started");

        let store = Arc::clone(&self.store);
        let clients = Arc::clone(&self.clients);
        let progress = Arc::clone(&self.progress);
        let limiters = Arc::clone(&self.limiters);
        let options = self.options.clone();
        tokio::spawn(async move {
            if let Err(e) =
                engine::run(store, clients, Arc::clone(&progress), limiters, key, targets, options)
                    .await
            {
                warn!(key = %key, error = %e, "sync run aborted");
                progress.set_status(key, RunStatus::Error);
            }
        });

        Ok(StartedSync {
            progress_key: key,
            total,
        })
    }

    /// Poll the progress of a run. `None` for unknown or evicted keys.
    pub fn progress(&self, key: Uuid) -> Option<ProgressSnapshot> {
        self.progress.snapshot(key)
    }

    /// Ask a running sync to stop at the next group boundary.
    ///
    /// Returns whether a record for the key exists.
    pub fn request_stop(&self, key: Uuid) -> bool {
        self.progress.request_stop(key)
    }
}
