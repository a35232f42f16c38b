//! Product entity - the local persisted shape of an external catalog product.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product model - one catalog product synced from an external connection.
///
/// The natural key is `(connection_id, external_id)`: the platform's numeric
/// product id is stable within one shop but not across shops.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Reference to the connection this product was synced from.
    pub connection_id: Uuid,
    /// Platform-specific numeric product id.
    pub external_id: i64,

    /// Product title.
    pub title: String,
    /// Product description.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Stock-keeping unit, if the platform provides one.
    pub sku: Option<String>,
    /// Listed price in the shop's currency.
    pub price: Option<f64>,
    /// Whether the product is visible in the shop.
    #[sea_orm(default_value = true)]
    pub visible: bool,

    /// Rendered attribute list (name + display value per attribute), stored
    /// as JSON for cross-database compatibility.
    #[sea_orm(column_type = "Json")]
    pub attributes: serde_json::Value,

    /// The platform's last-modified timestamp for this product, used for the
    /// "already up to date" short-circuit during sync.
    pub external_updated_at: Option<DateTimeWithTimeZone>,
    /// When this record was last synced from the platform.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product belongs to a connection.
    #[sea_orm(
        belongs_to = "super::connection::Entity",
        from = "Column::ConnectionId",
        to = "super::connection::Column::Id"
    )]
    Connection,
}

impl Related<super::connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
