//! Catalog synchronization: batching, rate-limited fetching, progress
//! accounting, and cooperative cancellation.

mod attributes;
mod chunk;
mod engine;
mod mapper;
mod progress;
mod service;
mod types;

pub use attributes::AttributeCache;
pub use chunk::chunk;
pub use progress::{ProgressSnapshot, ProgressStore, RunStatus};
pub use service::{SyncError, SyncService};
pub use types::{
    StartedSync, SyncOptions, SyncOutcome, DEFAULT_GROUP_CONCURRENCY, DEFAULT_RETENTION,
    PLATFORM_BATCH_LIMIT,
};
