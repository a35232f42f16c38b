use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use uuid::Uuid;

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Fallback rate budget for connections with no configured rate, in
/// requests per second. Conservative because the platform's throttling is
/// undocumented and bans are sticky.
pub const DEFAULT_RPS: u32 = 5;

/// A per-connection API rate limiter using the governor crate.
///
/// Callers suspend until the limiter admits them; work is never dropped.
/// The limiter only governs admission timing; failures of the admitted
/// operation pass through untouched, and nothing is retried here.
///
/// # Example
///
/// ```ignore
/// use shopsync::platform::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(5); // 5 requests per second
/// let products = limiter.execute(|| client.fetch_batch(requests)).await?;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// A `requests_per_second` of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap());
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }

    /// Run one unit of work once the limiter admits it.
    ///
    /// Suspends until admitted, then runs the future the closure produces
    /// and returns its output as-is. Errors are neither suppressed nor
    /// retried.
    pub async fn execute<F, Fut, T>(&self, unit_of_work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.inner.until_ready().await;
        unit_of_work().await
    }
}

/// Hands out one shared [`ApiRateLimiter`] per connection.
///
/// Each connection has its own credentials and its own rate budget on the
/// platform side. Limiters are therefore scoped per connection id; unrelated
/// connections are never cross-throttled. Requesting a limiter for the same
/// connection twice returns handles to the same underlying limiter, which is
/// what keeps concurrent runs against one shop inside that shop's budget.
#[derive(Default)]
pub struct RateLimiterRegistry {
    limiters: Mutex<HashMap<Uuid, ApiRateLimiter>>,
}

impl RateLimiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the limiter for a connection.
    pub fn limiter_for(&self, connection_id: Uuid, requests_per_second: u32) -> ApiRateLimiter {
        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        limiters
            .entry(connection_id)
            .or_insert_with(|| ApiRateLimiter::new(requests_per_second))
            .clone()
    }
}
