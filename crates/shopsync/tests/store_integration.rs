#![cfg(all(feature = "sqlite", feature = "migrate"))]

//! Store-level tests against a migrated in-memory SQLite database.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde_json::json;
use uuid::Uuid;

use shopsync::entity::prelude::ConnectionActiveModel;
use shopsync::repository;
use shopsync::store::{CatalogStore, ProductFields, SeaOrmStore};

async fn store_with_connection() -> (SeaOrmStore, Uuid) {
    let db = shopsync::connect_and_migrate("sqlite::memory:")
        .await
        .expect("in-memory sqlite with migrations");

    let connection_id = Uuid::new_v4();
    repository::connections::insert(
        &db,
        ConnectionActiveModel {
            id: Set(connection_id),
            name: Set("test-shop".to_string()),
            api_base: Set("https://api.example.com/shops/1".to_string()),
            api_key: Set("key".to_string()),
            api_secret: Set("secret".to_string()),
            requests_per_second: Set(5),
            created_at: Set(Utc::now().fixed_offset()),
        },
    )
    .await
    .expect("insert connection");

    (SeaOrmStore::new(Arc::new(db)), connection_id)
}

fn fields(title: &str) -> ProductFields {
    ProductFields {
        title: title.to_string(),
        description: None,
        sku: Some("SKU-1".to_string()),
        price: Some(19.5),
        visible: true,
        attributes: json!([]),
        external_updated_at: Some(Utc::now()),
    }
}

#[tokio::test]
async fn upsert_by_natural_key_updates_in_place() {
    let (store, connection_id) = store_with_connection().await;

    store
        .upsert_product(connection_id, 42, fields("first title"))
        .await
        .expect("insert");
    let inserted = store
        .find_product(connection_id, 42)
        .await
        .expect("lookup")
        .expect("product exists");

    store
        .upsert_product(connection_id, 42, fields("second title"))
        .await
        .expect("update");
    let updated = store
        .find_product(connection_id, 42)
        .await
        .expect("lookup")
        .expect("product exists");

    // Same row, new content.
    assert_eq!(updated.id, inserted.id);
    assert_eq!(updated.title, "second title");
}

#[tokio::test]
async fn sync_targets_resolve_known_rows_and_drop_unknown_ids() {
    let (store, connection_id) = store_with_connection().await;

    store
        .upsert_product(connection_id, 7, fields("seven"))
        .await
        .expect("insert");
    let row = store
        .find_product(connection_id, 7)
        .await
        .expect("lookup")
        .expect("product exists");

    let targets = store
        .list_sync_targets(&[row.id, Uuid::new_v4()])
        .await
        .expect("resolve");

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].external_id, 7);
    assert_eq!(targets[0].connection_id, connection_id);
}

#[tokio::test]
async fn products_of_distinct_connections_do_not_collide() {
    let (store, connection_id) = store_with_connection().await;

    store
        .upsert_product(connection_id, 1, fields("only here"))
        .await
        .expect("insert");

    let other = store
        .find_product(Uuid::new_v4(), 1)
        .await
        .expect("lookup");
    assert!(other.is_none());
}
