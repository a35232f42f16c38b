//! Maps external product payloads onto local product rows.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::platform::{AttributeDescriptor, AttributeValue, ExternalProduct};
use crate::store::{CatalogStore, ProductFields};

use super::types::SyncOutcome;

/// Persist one fetched product, or explain why it was not persisted.
///
/// Unless `force` is set, a product whose local `external_updated_at` is at
/// least as new as the payload's timestamp is left untouched and reported as
/// [`SyncOutcome::Skipped`]. Payloads without an id or an update timestamp
/// can never be proven current, so they always go through the write path
/// (or fail, for the missing id).
pub(crate) async fn sync_product(
    store: &dyn CatalogStore,
    connection_id: Uuid,
    payload: ExternalProduct,
    descriptors: &HashMap<i64, AttributeDescriptor>,
    force: bool,
) -> SyncOutcome {
    let Some(external_id) = payload.id else {
        return SyncOutcome::Failed("payload is missing the product id".to_string());
    };

    if !force {
        match store.find_product(connection_id, external_id).await {
            Ok(Some(existing)) => {
                let up_to_date = match (existing.external_updated_at, payload.updated_at) {
                    (Some(local), Some(remote)) => local.with_timezone(&Utc) >= remote,
                    _ => false,
                };
                if up_to_date {
                    return SyncOutcome::Skipped;
                }
            }
            Ok(None) => {}
            Err(e) => return SyncOutcome::Failed(e.to_string()),
        }
    }

    let fields = map_fields(payload, descriptors);
    match store.upsert_product(connection_id, external_id, fields).await {
        Ok(()) => SyncOutcome::Synced,
        Err(e) => SyncOutcome::Failed(e.to_string()),
    }
}

/// Build the persisted field set from an external payload.
///
/// Attribute references are rendered into the `attributes` JSON column as
/// `[{attribute_id, name, value}]`, with the descriptor supplying the
/// display name and any prefix/postfix decoration. References whose
/// descriptor failed to resolve keep a placeholder name and an undecorated
/// value rather than being dropped.
pub(crate) fn map_fields(
    payload: ExternalProduct,
    descriptors: &HashMap<i64, AttributeDescriptor>,
) -> ProductFields {
    let attributes: Vec<serde_json::Value> = payload
        .attributes
        .iter()
        .map(|attr| {
            let descriptor = descriptors.get(&attr.attribute_id);
            let name = descriptor
                .map(|d| d.name.clone())
                .unwrap_or_else(|| format!("attribute-{}", attr.attribute_id));
            let mut rendered = render_value(&attr.value);
            if let Some(descriptor) = descriptor {
                if let Some(prefix) = &descriptor.prefix {
                    rendered = format!("{prefix}{rendered}");
                }
                if let Some(postfix) = &descriptor.postfix {
                    rendered = format!("{rendered}{postfix}");
                }
            }
            json!({
                "attribute_id": attr.attribute_id,
                "name": name,
                "value": rendered,
            })
        })
        .collect();

    ProductFields {
        title: payload.title,
        description: payload.description,
        sku: payload.sku,
        price: payload.price,
        visible: payload.visible,
        attributes: serde_json::Value::Array(attributes),
        external_updated_at: payload.updated_at,
    }
}

fn render_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Scalar(s) => s.clone(),
        AttributeValue::List(items) => items.join(", "),
        AttributeValue::Unresolved(raw) => raw.to_string(),
    }
}
