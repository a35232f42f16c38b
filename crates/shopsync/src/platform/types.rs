use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::entity::connection::Model as ConnectionModel;

use super::errors::Result;

/// Minimal HTTP method enum for batch sub-requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// One sub-request inside a multiplexed batch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRequest {
    pub method: HttpMethod,
    /// URI relative to the connection's API base.
    pub uri: String,
}

impl SubRequest {
    /// Build a GET sub-request for the given relative URI.
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            uri: uri.into(),
        }
    }
}

/// One sub-response from a multiplexed batch call.
///
/// The platform answers a batch with one sub-response per sub-request, in
/// request order, each carrying its own status code and JSON body.
#[derive(Debug, Clone, Deserialize)]
pub struct SubResponse {
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl SubResponse {
    /// Whether the sub-request succeeded (2xx).
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Kind of attribute an attribute id refers to.
///
/// The platform keys its attribute-description endpoint on both the id and
/// whether the attribute hangs off the product or one of its variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    #[default]
    Product,
    Variant,
}

impl AttributeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Product => "product",
            AttributeKind::Variant => "variant",
        }
    }
}

/// A dynamically-typed attribute value as the platform ships it.
///
/// Payloads carry attribute values as strings, numbers, arrays, or nested
/// objects depending on the attribute type. The union is fixed at the wire
/// boundary so the mapper never sees an untyped JSON value: scalars and
/// scalar lists get their own variants, anything else stays `Unresolved`
/// with the raw JSON preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Scalar(String),
    List(Vec<String>),
    Unresolved(serde_json::Value),
}

impl From<serde_json::Value> for AttributeValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        fn scalar_of(value: &Value) -> Option<String> {
            match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            }
        }

        if let Some(scalar) = scalar_of(&value) {
            return AttributeValue::Scalar(scalar);
        }
        if let Value::Array(items) = &value {
            let scalars: Option<Vec<String>> = items.iter().map(scalar_of).collect();
            if let Some(scalars) = scalars {
                return AttributeValue::List(scalars);
            }
        }
        AttributeValue::Unresolved(value)
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(AttributeValue::from(value))
    }
}

/// One attribute reference inside an external product payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributeRef {
    pub attribute_id: i64,
    #[serde(default)]
    pub kind: AttributeKind,
    pub value: AttributeValue,
}

/// Shared display/formatting metadata for a catalog attribute.
///
/// Fetched at most once per distinct attribute id per sync run and reused
/// across every product in the run that references it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeDescriptor {
    pub id: i64,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub postfix: Option<String>,
}

/// An external product payload as fetched from the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalProduct {
    /// The platform's stable numeric product id. Payloads without one are
    /// malformed and counted as failed by the mapper.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: Vec<AttributeRef>,
}

fn default_visible() -> bool {
    true
}

/// Trait for external catalog platform clients.
///
/// One client instance is bound to one connection (shop) and carries its
/// credentials. Implementors translate transport and platform errors into
/// `PlatformError`; they do not retry or rate-limit, since admission pacing is
/// the rate limiter's job and retry policy belongs to the caller.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// The connection this client is bound to.
    fn connection_id(&self) -> Uuid;

    /// Issue one multiplexed batch call carrying `requests` sub-requests.
    ///
    /// On success the platform returns one sub-response per sub-request in
    /// request order; individual sub-responses carry their own status codes
    /// and may themselves be failures.
    async fn fetch_batch(&self, requests: Vec<SubRequest>) -> Result<Vec<SubResponse>>;

    /// Fetch the descriptor for one attribute id.
    async fn fetch_attribute(
        &self,
        attribute_id: i64,
        kind: AttributeKind,
    ) -> Result<AttributeDescriptor>;
}

/// Builds a [`CatalogClient`] for a connection.
///
/// The sync engine resolves connections from the local store at the start of
/// a run and asks the factory for one client per distinct connection.
pub trait ClientFactory: Send + Sync {
    fn client_for(&self, connection: &ConnectionModel) -> Result<Arc<dyn CatalogClient>>;
}
