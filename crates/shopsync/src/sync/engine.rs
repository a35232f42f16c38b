//! The run loop: plans batches, dispatches them in bounded groups, and
//! accounts every target exactly once.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::platform::{
    ApiRateLimiter, CatalogClient, ClientFactory, ExternalProduct, RateLimiterRegistry, SubRequest,
};
use crate::store::{CatalogStore, SyncTarget};

use super::attributes::AttributeCache;
use super::chunk::chunk;
use super::mapper::sync_product;
use super::progress::{ProgressStore, RunStatus};
use super::service::SyncError;
use super::types::{SyncOptions, SyncOutcome};

/// One planned batch call: a slice of a connection's targets plus the
/// per-connection machinery the batch needs.
struct BatchPlan {
    connection_id: Uuid,
    ids: Vec<i64>,
    client: Arc<dyn CatalogClient>,
    limiter: ApiRateLimiter,
    attributes: Arc<AttributeCache>,
}

/// Execute one sync run to a terminal status.
///
/// Targets are grouped by connection and split into batches of at most
/// `options.batch_size`. Batches are dispatched `options.group_concurrency`
/// at a time; the stop flag is honored between groups, never inside one.
/// Fatal setup errors (an unknown connection, a client that cannot be
/// built) surface as `Err` before any batch is dispatched; per-batch and
/// per-product failures are absorbed into the error counter instead.
#[tracing::instrument(skip_all, fields(key = %key, targets = targets.len()))]
pub(crate) async fn run(
    store: Arc<dyn CatalogStore>,
    clients: Arc<dyn ClientFactory>,
    progress: Arc<ProgressStore>,
    limiters: Arc<RateLimiterRegistry>,
    key: Uuid,
    targets: Vec<SyncTarget>,
    options: SyncOptions,
) -> Result<(), SyncError> {
    // BTreeMap so batch order is stable across runs.
    let mut by_connection: BTreeMap<Uuid, Vec<i64>> = BTreeMap::new();
    for target in targets {
        by_connection
            .entry(target.connection_id)
            .or_default()
            .push(target.external_id);
    }

    // Resolve every connection before dispatching anything. A target set
    // referencing a connection that no longer exists is a caller error,
    // not a partial failure.
    let mut plans = Vec::new();
    for (connection_id, ids) in by_connection {
        let connection = store
            .find_connection(connection_id)
            .await?
            .ok_or(SyncError::ConnectionNotFound(connection_id))?;
        let client = clients.client_for(&connection)?;
        let limiter = limiters.limiter_for(connection_id, connection.rate_budget());
        let attributes = Arc::new(AttributeCache::new(
            Arc::clone(&client),
            limiter.clone(),
        ));
        for ids in chunk(&ids, options.batch_size) {
            plans.push(BatchPlan {
                connection_id,
                ids,
                client: Arc::clone(&client),
                limiter: limiter.clone(),
                attributes: Arc::clone(&attributes),
            });
        }
    }

    let group_size = options.group_concurrency.max(1);
    let force = options.force;
    let mut stopped = false;
    let mut pending = plans.into_iter();
    loop {
        if progress.stop_requested(key) {
            stopped = true;
            break;
        }
        let group: Vec<BatchPlan> = pending.by_ref().take(group_size).collect();
        if group.is_empty() {
            break;
        }

        let mut handles = Vec::with_capacity(group.len());
        for plan in group {
            let store = Arc::clone(&store);
            let progress = Arc::clone(&progress);
            let batch_len = plan.ids.len() as u64;
            let handle = tokio::spawn(async move {
                process_batch(store, progress, key, plan, force).await;
            });
            handles.push((handle, batch_len));
        }
        for (handle, batch_len) in handles {
            if handle.await.is_err() {
                warn!(key = %key, "batch task panicked");
                progress.increment(key, 0, batch_len);
            }
        }
    }

    let status = if stopped {
        RunStatus::Stopped
    } else {
        RunStatus::Completed
    };
    progress.set_status(key, status);
    if let Some(snapshot) = progress.snapshot(key) {
        info!(
            key = %key,
            status = %status,
            synced = snapshot.synced,
            errors = snapshot.errors,
            "sync run finished"
        );
    }
    Ok(())
}

/// Fetch one batch and account every one of its ids exactly once.
async fn process_batch(
    store: Arc<dyn CatalogStore>,
    progress: Arc<ProgressStore>,
    key: Uuid,
    plan: BatchPlan,
    force: bool,
) {
    let requests: Vec<SubRequest> = plan
        .ids
        .iter()
        .map(|id| SubRequest::get(format!("products/{id}.json")))
        .collect();

    // Batch calls are never retried: a retry would refetch every product in
    // the batch and double the accounting. A failed call fails all its ids.
    let responses = match plan
        .limiter
        .execute(|| plan.client.fetch_batch(requests))
        .await
    {
        Ok(responses) => responses,
        Err(e) => {
            warn!(
                connection = %plan.connection_id,
                batch_size = plan.ids.len(),
                error = %e,
                "batch call failed"
            );
            progress.increment(key, 0, plan.ids.len() as u64);
            return;
        }
    };

    let mut fetched: Vec<ExternalProduct> = Vec::with_capacity(plan.ids.len());
    let mut errors = 0u64;
    for (id, response) in plan.ids.iter().zip(responses.iter()) {
        if !response.is_success() {
            debug!(
                connection = %plan.connection_id,
                external_id = id,
                status = response.status,
                "sub-request failed"
            );
            errors += 1;
            continue;
        }
        match serde_json::from_value::<ExternalProduct>(response.body.clone()) {
            Ok(product) => fetched.push(product),
            Err(e) => {
                warn!(
                    connection = %plan.connection_id,
                    external_id = id,
                    error = %e,
                    "undecodable product payload"
                );
                errors += 1;
            }
        }
    }
    // A short response leaves trailing ids unanswered; they count as errors.
    if responses.len() < plan.ids.len() {
        errors += (plan.ids.len() - responses.len()) as u64;
    }
    if errors > 0 {
        progress.increment(key, 0, errors);
    }

    let refs: Vec<(i64, crate::platform::AttributeKind)> = fetched
        .iter()
        .flat_map(|p| p.attributes.iter().map(|a| (a.attribute_id, a.kind)))
        .collect();
    let descriptors = plan.attributes.resolve(&refs).await;

    for product in fetched {
        let external_id = product.id;
        match sync_product(
            store.as_ref(),
            plan.connection_id,
            product,
            &descriptors,
            force,
        )
        .await
        {
            SyncOutcome::Synced | SyncOutcome::Skipped => progress.increment(key, 1, 0),
            SyncOutcome::Failed(reason) => {
                warn!(
                    connection = %plan.connection_id,
                    external_id = ?external_id,
                    reason,
                    "product sync failed"
                );
                progress.increment(key, 0, 1);
            }
        }
    }
}
