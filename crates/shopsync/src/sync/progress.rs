//! Process-wide progress records for in-flight and recently-finished runs.
//!
//! The store is the single source of truth a polling client sees: the
//! orchestrator's batch workers increment counters as entities land, and the
//! request layer reads snapshots by progress key. Everything lives behind one
//! mutex-guarded map. The map itself is never exposed, so there is no way
//! to read-modify-write counters outside the lock.
//!
//! Records are memory-only by design: a process restart loses in-flight and
//! recently-completed run state. Finished records stay pollable for a
//! retention window and are then evicted by [`ProgressStore::sweep`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

/// Status of one sync run.
///
/// Transitions only move forward: `Syncing` is the sole non-terminal state,
/// and once a run reaches a terminal state its counters are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Syncing,
    Completed,
    Error,
    Stopped,
}

impl RunStatus {
    /// Whether this status is terminal.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Syncing)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Syncing => "syncing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A point-in-time view of one run, as handed to polling clients.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub synced: u64,
    pub errors: u64,
    pub status: RunStatus,
}

#[derive(Debug)]
struct RunRecord {
    total: u64,
    synced: u64,
    errors: u64,
    status: RunStatus,
    stop_requested: bool,
    finished_at: Option<Instant>,
}

impl RunRecord {
    fn new(total: u64) -> Self {
        Self {
            total,
            synced: 0,
            errors: 0,
            status: RunStatus::Syncing,
            stop_requested: false,
            finished_at: None,
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            synced: self.synced,
            errors: self.errors,
            status: self.status,
        }
    }
}

/// Keyed, concurrency-safe progress records for sync runs.
#[derive(Debug, Default)]
pub struct ProgressStore {
    runs: Mutex<HashMap<Uuid, RunRecord>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations here must survive a panicked worker, so a poisoned lock is
    /// recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, RunRecord>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initialize a run record with zeroed counters and `Syncing` status.
    ///
    /// An existing record under the same key is silently overwritten; key
    /// uniqueness is the launcher's responsibility.
    pub fn create(&self, key: Uuid, total: u64) {
        self.lock().insert(key, RunRecord::new(total));
    }

    /// Atomically add deltas to a run's counters.
    ///
    /// A no-op on an unknown key (background workers must never crash on a
    /// stale key) and a no-op once the run is terminal (counters freeze).
    pub fn increment(&self, key: Uuid, synced: u64, errors: u64) {
        let mut runs = self.lock();
        if let Some(record) = runs.get_mut(&key) {
            if record.status.is_terminal() {
                return;
            }
            record.synced += synced;
            record.errors += errors;
        }
    }

    /// Transition a run to a new status.
    ///
    /// The store records whatever the orchestrator issues; only-forward
    /// transition discipline is the orchestrator's job. Terminal statuses
    /// are stamped with a finish time for the retention sweep.
    pub fn set_status(&self, key: Uuid, status: RunStatus) {
        let mut runs = self.lock();
        if let Some(record) = runs.get_mut(&key) {
            record.status = status;
            if status.is_terminal() && record.finished_at.is_none() {
                record.finished_at = Some(Instant::now());
            }
        }
    }

    /// Read a snapshot of a run, or `None` for an unknown key.
    pub fn snapshot(&self, key: Uuid) -> Option<ProgressSnapshot> {
        self.lock().get(&key).map(RunRecord::snapshot)
    }

    /// Request cooperative cancellation of a run.
    ///
    /// Takes effect the next time the orchestrator checks the flag at a
    /// dispatch boundary; batch calls already in flight finish first.
    /// Returns `false` for an unknown key.
    pub fn request_stop(&self, key: Uuid) -> bool {
        let mut runs = self.lock();
        match runs.get_mut(&key) {
            Some(record) => {
                record.stop_requested = true;
                true
            }
            None => false,
        }
    }

    /// Whether cancellation has been requested for a run.
    pub fn stop_requested(&self, key: Uuid) -> bool {
        self.lock().get(&key).is_some_and(|r| r.stop_requested)
    }

    /// Remove a run record. Returns whether a record existed.
    pub fn clear(&self, key: Uuid) -> bool {
        self.lock().remove(&key).is_some()
    }

    /// Evict terminal runs that finished longer than `retention` ago.
    ///
    /// Returns the number of evicted records. In-flight runs are never
    /// touched.
    pub fn sweep(&self, retention: Duration) -> usize {
        let mut runs = self.lock();
        let before = runs.len();
        runs.retain(|_, record| {
            record
                .finished_at
                .is_none_or(|finished| finished.elapsed() < retention)
        });
        before - runs.len()
    }

    /// Number of tracked runs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn create_and_snapshot() {
        let store = ProgressStore::new();
        let key = Uuid::new_v4();
        store.create(key, 450);

        let snapshot = store.snapshot(key).unwrap();
        assert_eq!(snapshot.total, 450);
        assert_eq!(snapshot.synced, 0);
        assert_eq!(snapshot.errors, 0);
        assert_eq!(snapshot.status, RunStatus::Syncing);
    }

    #[test]
    fn unknown_key_is_not_found() {
        let store = ProgressStore::new();
        assert!(store.snapshot(Uuid::new_v4()).is_none());
        assert!(!store.request_stop(Uuid::new_v4()));
        assert!(!store.clear(Uuid::new_v4()));
        // increment on a stale key must not panic
        store.increment(Uuid::new_v4(), 1, 0);
    }

    #[test]
    fn concurrent_increments_lose_no_updates() {
        let store = Arc::new(ProgressStore::new());
        let key = Uuid::new_v4();
        store.create(key, 8 * 250);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..250u64 {
                        if i % 5 == 0 {
                            store.increment(key, 0, 1);
                        } else {
                            store.increment(key, 1, 0);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = store.snapshot(key).unwrap();
        assert_eq!(snapshot.synced + snapshot.errors, 8 * 250);
        assert_eq!(snapshot.errors, 8 * 50);
    }

    #[test]
    fn counters_freeze_after_terminal_status() {
        let store = ProgressStore::new();
        let key = Uuid::new_v4();
        store.create(key, 10);
        store.increment(key, 3, 1);
        store.set_status(key, RunStatus::Completed);

        store.increment(key, 5, 5);

        let snapshot = store.snapshot(key).unwrap();
        assert_eq!(snapshot.synced, 3);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.status, RunStatus::Completed);
    }

    #[test]
    fn stop_flag_round_trips() {
        let store = ProgressStore::new();
        let key = Uuid::new_v4();
        store.create(key, 10);

        assert!(!store.stop_requested(key));
        assert!(store.request_stop(key));
        assert!(store.stop_requested(key));
    }

    #[test]
    fn sweep_evicts_only_finished_runs() {
        let store = ProgressStore::new();
        let running = Uuid::new_v4();
        let finished = Uuid::new_v4();
        store.create(running, 10);
        store.create(finished, 10);
        store.set_status(finished, RunStatus::Stopped);

        let evicted = store.sweep(Duration::ZERO);
        assert_eq!(evicted, 1);
        assert!(store.snapshot(running).is_some());
        assert!(store.snapshot(finished).is_none());
    }

    #[test]
    fn sweep_respects_retention_window() {
        let store = ProgressStore::new();
        let key = Uuid::new_v4();
        store.create(key, 10);
        store.set_status(key, RunStatus::Completed);

        // Freshly finished runs stay pollable inside the window.
        assert_eq!(store.sweep(Duration::from_secs(3600)), 0);
        assert!(store.snapshot(key).is_some());
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(RunStatus::Syncing.to_string(), "syncing");
        assert_eq!(RunStatus::Stopped.to_string(), "stopped");
    }

    #[test]
    fn snapshot_serializes_for_polling_clients() {
        let store = ProgressStore::new();
        let key = Uuid::new_v4();
        store.create(key, 3);
        store.increment(key, 2, 1);
        store.set_status(key, RunStatus::Completed);

        let json = serde_json::to_value(store.snapshot(key).unwrap()).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["synced"], 2);
        assert_eq!(json["errors"], 1);
        assert_eq!(json["status"], "completed");
    }
}
