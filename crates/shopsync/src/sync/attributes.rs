//! Run-scoped attribute descriptor resolution.
//!
//! Product payloads in this domain repeat the same attribute references
//! ("color", "material") across thousands of variants. Resolving descriptors
//! per entity would multiply call volume by catalog size, so one cache lives
//! for the duration of a run: every distinct attribute id is fetched at most
//! once, through the connection's rate limiter, and the result, including
//! a failed resolution, is memoized.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use backon::Retryable;
use tokio::sync::Mutex;
use tracing::warn;

use crate::platform::{ApiRateLimiter, AttributeDescriptor, AttributeKind, CatalogClient};
use crate::retry::default_backoff;

/// Deduplicating, memoizing descriptor resolver for one connection's run.
pub struct AttributeCache {
    client: Arc<dyn CatalogClient>,
    limiter: ApiRateLimiter,
    /// `None` marks an id whose resolution failed; it is not refetched.
    resolved: Mutex<HashMap<i64, Option<AttributeDescriptor>>>,
}

impl AttributeCache {
    pub fn new(client: Arc<dyn CatalogClient>, limiter: ApiRateLimiter) -> Self {
        Self {
            client,
            limiter,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve descriptors for every distinct attribute id in `refs`.
    ///
    /// Issues the minimum necessary fetches: ids already memoized from
    /// earlier batches of the same run cost nothing, and duplicate ids
    /// within `refs` are collapsed before any call is made. Ids that fail
    /// to resolve are absent from the returned map; callers treat absence
    /// as "no descriptor available", not as an error.
    ///
    /// The memo lock is held across the fetches so concurrent batches of
    /// one run cannot race into duplicate fetches for the same id.
    pub async fn resolve(
        &self,
        refs: &[(i64, AttributeKind)],
    ) -> HashMap<i64, AttributeDescriptor> {
        let mut resolved = self.resolved.lock().await;

        let mut seen = HashSet::new();
        let missing: Vec<(i64, AttributeKind)> = refs
            .iter()
            .copied()
            .filter(|(id, _)| seen.insert(*id) && !resolved.contains_key(id))
            .collect();

        for (id, kind) in missing {
            let outcome = (|| self.limiter.execute(|| self.client.fetch_attribute(id, kind)))
                .retry(default_backoff())
                .when(|e| e.is_transient())
                .await;
            match outcome {
                Ok(descriptor) => {
                    resolved.insert(id, Some(descriptor));
                }
                Err(e) => {
                    warn!(attribute = id, error = %e, "attribute resolution failed");
                    resolved.insert(id, None);
                }
            }
        }

        let mut descriptors = HashMap::new();
        for (id, _) in refs {
            if let Some(Some(descriptor)) = resolved.get(id) {
                descriptors
                    .entry(*id)
                    .or_insert_with(|| descriptor.clone());
            }
        }
        descriptors
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::platform::{PlatformError, SubRequest, SubResponse};

    use super::*;

    struct CountingClient {
        fetches: AtomicUsize,
        failing_id: Option<i64>,
    }

    impl CountingClient {
        fn new(failing_id: Option<i64>) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                failing_id,
            }
        }
    }

    #[async_trait]
    impl CatalogClient for CountingClient {
        fn connection_id(&self) -> Uuid {
            Uuid::nil()
        }

        async fn fetch_batch(
            &self,
            _requests: Vec<SubRequest>,
        ) -> crate::platform::Result<Vec<SubResponse>> {
            unreachable!("attribute cache never issues batch calls");
        }

        async fn fetch_attribute(
            &self,
            attribute_id: i64,
            _kind: AttributeKind,
        ) -> crate::platform::Result<AttributeDescriptor> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing_id == Some(attribute_id) {
                return Err(PlatformError::api("no such attribute"));
            }
            Ok(AttributeDescriptor {
                id: attribute_id,
                name: format!("attribute-{attribute_id}"),
                prefix: None,
                postfix: None,
            })
        }
    }

    fn cache_with(client: Arc<CountingClient>) -> AttributeCache {
        AttributeCache::new(client, ApiRateLimiter::new(10_000))
    }

    #[tokio::test]
    async fn repeated_references_cost_one_fetch() {
        let client = Arc::new(CountingClient::new(None));
        let cache = cache_with(Arc::clone(&client));

        let refs: Vec<(i64, AttributeKind)> =
            (0..500).map(|_| (7, AttributeKind::Product)).collect();
        let descriptors = cache.resolve(&refs).await;

        assert_eq!(client.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[&7].name, "attribute-7");
    }

    #[tokio::test]
    async fn memo_spans_multiple_resolves() {
        let client = Arc::new(CountingClient::new(None));
        let cache = cache_with(Arc::clone(&client));

        cache.resolve(&[(1, AttributeKind::Product), (2, AttributeKind::Variant)]).await;
        let second = cache
            .resolve(&[(2, AttributeKind::Variant), (3, AttributeKind::Product)])
            .await;

        // 1, 2, 3 fetched once each; 2 came from the memo the second time.
        assert_eq!(client.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn failed_resolutions_are_absent_and_not_refetched() {
        let client = Arc::new(CountingClient::new(Some(9)));
        let cache = cache_with(Arc::clone(&client));

        let refs = [(9, AttributeKind::Product), (4, AttributeKind::Product)];
        let first = cache.resolve(&refs).await;
        assert!(!first.contains_key(&9));
        assert!(first.contains_key(&4));

        let fetches_after_first = client.fetches.load(Ordering::SeqCst);
        let second = cache.resolve(&refs).await;
        assert!(!second.contains_key(&9));
        assert_eq!(client.fetches.load(Ordering::SeqCst), fetches_after_first);
    }

    #[tokio::test]
    async fn empty_refs_fetch_nothing() {
        let client = Arc::new(CountingClient::new(None));
        let cache = cache_with(Arc::clone(&client));

        let descriptors = cache.resolve(&[]).await;
        assert!(descriptors.is_empty());
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);
    }
}
