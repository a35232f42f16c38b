//! The external catalog platform boundary.
//!
//! This module defines the [`CatalogClient`] trait, the one seam all
//! platform I/O goes through, plus the wire types of the platform's batch
//! protocol and the per-connection rate limiting that keeps the engine inside
//! the platform's tolerated request rate.
//!
//! # Example
//!
//! ```ignore
//! use shopsync::platform::{CatalogClient, SubRequest};
//!
//! async fn fetch_one(client: &dyn CatalogClient) {
//!     let responses = client
//!         .fetch_batch(vec![SubRequest::get("products/17.json")])
//!         .await?;
//!     println!("status {}", responses[0].status);
//! }
//! ```

mod errors;
mod rate_limit;
#[cfg(feature = "rest")]
mod rest;
mod types;

pub use errors::{PlatformError, Result};
pub use rate_limit::{ApiRateLimiter, DEFAULT_RPS, RateLimiterRegistry};
#[cfg(feature = "rest")]
pub use rest::{REQUEST_TIMEOUT, RestCatalogClient, RestClientFactory};
pub use types::{
    AttributeDescriptor, AttributeKind, AttributeRef, AttributeValue, CatalogClient,
    ClientFactory, ExternalProduct, HttpMethod, SubRequest, SubResponse,
};
