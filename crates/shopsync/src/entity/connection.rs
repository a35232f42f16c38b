//! Connection entity - credentials and endpoint for one external catalog source.
//!
//! A connection describes a single shop on the external e-commerce platform:
//! its API base URL, the key/secret pair used to authenticate, and the request
//! rate the platform tolerates for that shop. A deployment typically carries a
//! handful of connections (one per shop), and a sync run may span several of
//! them at once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Connection model - one configured external catalog source.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connections")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// User-friendly name for this connection (e.g., "main-shop", "outlet").
    /// Must be unique across all connections.
    #[sea_orm(unique)]
    pub name: String,

    /// Base URL of the platform API for this shop, without a trailing slash
    /// (e.g., "https://api.shopplatform.example/shops/4711").
    pub api_base: String,

    /// API key used for authentication.
    pub api_key: String,

    /// API secret paired with the key.
    pub api_secret: String,

    /// Request rate this connection's shop tolerates, in requests per second.
    /// The platform enforces this per shop, so each connection gets its own
    /// rate limiter budget.
    pub requests_per_second: i32,

    /// When this connection was first configured.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A connection has many synced products.
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The effective rate budget, clamped to at least one request per second.
    pub fn rate_budget(&self) -> u32 {
        self.requests_per_second.max(1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn rate_budget_clamps_to_one() {
        let model = Model {
            id: Uuid::new_v4(),
            name: "misconfigured".to_string(),
            api_base: "https://api.example.com/shops/1".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            requests_per_second: 0,
            created_at: Utc::now().fixed_offset(),
        };
        assert_eq!(model.rate_budget(), 1);
    }
}
