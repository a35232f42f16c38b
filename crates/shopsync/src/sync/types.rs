//! Shared sync types and constants.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

/// The platform's documented per-request batch ceiling. Batches never carry
/// more sub-requests than this.
pub const PLATFORM_BATCH_LIMIT: usize = 200;

/// Number of batch calls in flight at once within one run.
///
/// Kept small on purpose: the platform applies secondary throttling well
/// below its published rate when too many batch calls overlap. Empirically
/// chosen against one platform; overridable via [`SyncOptions`].
pub const DEFAULT_GROUP_CONCURRENCY: usize = 2;

/// How long finished run records stay pollable before the retention sweep
/// may evict them.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Options for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum sub-requests per batch call.
    pub batch_size: usize,
    /// Number of batch calls dispatched concurrently per group.
    pub group_concurrency: usize,
    /// Bypass the "already up to date" short-circuit and re-persist every
    /// fetched product.
    pub force: bool,
    /// Retention window for finished run records.
    pub retention: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: PLATFORM_BATCH_LIMIT,
            group_concurrency: DEFAULT_GROUP_CONCURRENCY,
            force: false,
            retention: DEFAULT_RETENTION,
        }
    }
}

/// Outcome of syncing one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The product was persisted.
    Synced,
    /// The persisted state was already current; nothing was written.
    /// Counts toward `synced`: the local record matches the platform.
    Skipped,
    /// The product could not be synced.
    Failed(String),
}

/// What the launcher hands back to the caller: the key to poll progress
/// with, and how many entities the run will attempt.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StartedSync {
    pub progress_key: Uuid,
    pub total: u64,
}
