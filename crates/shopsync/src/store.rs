//! The persistence seam consumed by the sync engine.
//!
//! The engine never talks to sea-orm directly; everything it needs from the
//! local store goes through the [`CatalogStore`] trait. [`SeaOrmStore`] is
//! the production implementation over the repository module; tests swap in
//! in-memory implementations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, Set};
use uuid::Uuid;

use crate::entity::connection::Model as ConnectionModel;
use crate::entity::product::{ActiveModel as ProductActiveModel, Model as ProductModel};
use crate::repository::{self, Result};

/// One entity to sync: the platform's product id plus the connection that
/// owns it. Produced by [`CatalogStore::list_sync_targets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTarget {
    pub external_id: i64,
    pub connection_id: Uuid,
}

/// The mapped fields the engine persists for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub title: String,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub visible: bool,
    /// Rendered attribute list as stored in the `attributes` JSON column.
    pub attributes: serde_json::Value,
    pub external_updated_at: Option<DateTime<Utc>>,
}

/// Persistence operations the sync engine depends on.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a connection by id.
    async fn find_connection(&self, connection_id: Uuid) -> Result<Option<ConnectionModel>>;

    /// Resolve requested product row ids to sync targets.
    ///
    /// Ids that match no row are silently dropped; the run's `total` is the
    /// number of resolvable targets.
    async fn list_sync_targets(&self, product_ids: &[Uuid]) -> Result<Vec<SyncTarget>>;

    /// Find a product by its natural key.
    async fn find_product(
        &self,
        connection_id: Uuid,
        external_id: i64,
    ) -> Result<Option<ProductModel>>;

    /// Insert or update a product by its natural key.
    async fn upsert_product(
        &self,
        connection_id: Uuid,
        external_id: i64,
        fields: ProductFields,
    ) -> Result<()>;
}

/// [`CatalogStore`] backed by sea-orm.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for SeaOrmStore {
    async fn find_connection(&self, connection_id: Uuid) -> Result<Option<ConnectionModel>> {
        repository::connections::find_by_id(&self.db, connection_id).await
    }

    async fn list_sync_targets(&self, product_ids: &[Uuid]) -> Result<Vec<SyncTarget>> {
        let products = repository::products::find_many_by_ids(&self.db, product_ids).await?;
        Ok(products
            .into_iter()
            .map(|p| SyncTarget {
                external_id: p.external_id,
                connection_id: p.connection_id,
            })
            .collect())
    }

    async fn find_product(
        &self,
        connection_id: Uuid,
        external_id: i64,
    ) -> Result<Option<ProductModel>> {
        repository::products::find_by_natural_key(&self.db, connection_id, external_id).await
    }

    async fn upsert_product(
        &self,
        connection_id: Uuid,
        external_id: i64,
        fields: ProductFields,
    ) -> Result<()> {
        let model = ProductActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            connection_id: Set(connection_id),
            external_id: Set(external_id),
            title: Set(fields.title),
            description: Set(fields.description),
            sku: Set(fields.sku),
            price: Set(fields.price),
            visible: Set(fields.visible),
            attributes: Set(fields.attributes),
            external_updated_at: Set(fields.external_updated_at.map(|t| t.fixed_offset())),
            synced_at: Set(Utc::now().fixed_offset()),
        };
        repository::products::upsert(&self.db, model).await?;
        Ok(())
    }
}
