//! Shared retry utilities for platform operations.
//!
//! Only attribute-descriptor fetches are retried: they are cheap single
//! requests whose transient loss would otherwise degrade every product in
//! the run. Batch calls are never retried; a failed batch is counted
//! against its entities and the run moves on.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 500;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 15_000;

/// Maximum retries for a single descriptor fetch.
pub const MAX_FETCH_RETRIES: usize = 3;

/// Build the default exponential backoff strategy for descriptor fetches.
///
/// # Example
///
/// ```ignore
/// use backon::Retryable;
/// use shopsync::retry::default_backoff;
///
/// let descriptor = (|| client.fetch_attribute(3, kind))
///     .retry(default_backoff())
///     .when(|e| e.is_transient())
///     .await;
/// ```
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(INITIAL_BACKOFF_MS))
        .with_max_delay(Duration::from_millis(MAX_BACKOFF_MS))
        .with_max_times(MAX_FETCH_RETRIES)
        .with_jitter()
}
