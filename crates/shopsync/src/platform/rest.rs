//! reqwest-backed catalog client for the platform's REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::entity::connection::Model as ConnectionModel;

use super::errors::{PlatformError, Result};
use super::types::{
    AttributeDescriptor, AttributeKind, CatalogClient, ClientFactory, SubRequest, SubResponse,
};

/// Request timeout for platform calls.
///
/// Deliberately generous: a full batch of 200 sub-requests can take the
/// platform well over a minute to answer, and an aborted batch costs the
/// whole batch. This is the only hard time bound on a run.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct BatchEnvelope {
    responses: Vec<SubResponse>,
}

/// A catalog client speaking the platform's REST API for one connection.
#[derive(Clone)]
pub struct RestCatalogClient {
    connection_id: Uuid,
    api_base: String,
    api_key: String,
    api_secret: String,
    http: reqwest::Client,
}

impl RestCatalogClient {
    /// Build a client for `connection` using a shared reqwest client.
    pub fn new(connection: &ConnectionModel, http: reqwest::Client) -> Self {
        Self {
            connection_id: connection.id,
            api_base: connection.api_base.trim_end_matches('/').to_string(),
            api_key: connection.api_key.clone(),
            api_secret: connection.api_secret.clone(),
            http,
        }
    }

    fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.api_base, relative.trim_start_matches('/'))
    }

    fn map_transport_error(e: reqwest::Error) -> PlatformError {
        if e.is_timeout() || e.is_connect() {
            PlatformError::network(e.to_string())
        } else {
            PlatformError::api(e.to_string())
        }
    }

    fn check_status(status: reqwest::StatusCode, context: &str) -> Result<()> {
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PlatformError::AuthRequired);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PlatformError::not_found(context.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            // The platform does not announce a reset time on this endpoint;
            // assume the next full second.
            return Err(PlatformError::RateLimited {
                reset_at: chrono::Utc::now() + chrono::Duration::seconds(1),
            });
        }
        if !status.is_success() {
            return Err(PlatformError::api(format!(
                "{context}: unexpected status {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for RestCatalogClient {
    fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    async fn fetch_batch(&self, requests: Vec<SubRequest>) -> Result<Vec<SubResponse>> {
        let payload = json!({
            "requests": requests
                .iter()
                .map(|r| json!({ "method": r.method.as_str(), "uri": r.uri }))
                .collect::<Vec<_>>(),
        });

        let response = self
            .http
            .post(self.url("batch.json"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&payload)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        Self::check_status(response.status(), "batch")?;

        let envelope: BatchEnvelope = response
            .json()
            .await
            .map_err(|e| PlatformError::api(format!("undecodable batch envelope: {e}")))?;
        Ok(envelope.responses)
    }

    async fn fetch_attribute(
        &self,
        attribute_id: i64,
        kind: AttributeKind,
    ) -> Result<AttributeDescriptor> {
        let uri = format!("attributes/{}/{attribute_id}.json", kind.as_str());
        let response = self
            .http
            .get(self.url(&uri))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        Self::check_status(response.status(), &uri)?;

        response
            .json()
            .await
            .map_err(|e| PlatformError::api(format!("undecodable attribute descriptor: {e}")))
    }
}

/// Factory producing [`RestCatalogClient`]s that share one reqwest client.
pub struct RestClientFactory {
    http: reqwest::Client,
}

impl RestClientFactory {
    /// Build a factory with the default request timeout.
    ///
    /// # Errors
    /// Returns `PlatformError::Internal` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::internal(e.to_string()))?;
        Ok(Self { http })
    }

    /// Build a factory around an existing reqwest client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ClientFactory for RestClientFactory {
    fn client_for(&self, connection: &ConnectionModel) -> Result<Arc<dyn CatalogClient>> {
        Ok(Arc::new(RestCatalogClient::new(
            connection,
            self.http.clone(),
        )))
    }
}
