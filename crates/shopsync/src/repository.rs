//! CRUD operations for the local catalog store.
//!
//! This module provides free functions over the sea-orm entities: connection
//! lookups and product reads/upserts keyed by the natural key
//! `(connection_id, external_id)`.

pub mod connections;
mod errors;
pub mod products;

pub use errors::{RepositoryError, Result};
