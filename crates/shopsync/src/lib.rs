//! Catalog synchronization engine for external e-commerce platforms.
//!
//! `shopsync` pulls product catalogs from a remote platform API into a local
//! store. Platform limits shape the whole design: requests run through a
//! per-connection rate limiter, products are fetched via a multiplexed batch
//! endpoint instead of one call per product, and a small number of batch
//! calls run concurrently per run. Runs are launched in the background and
//! observed by polling a progress key; partial failure is the normal case
//! and is accounted per product, not per run.
//!
//! The typical setup wires a [`store::SeaOrmStore`] over a database opened
//! with [`connect_and_migrate`], a [`platform::RestClientFactory`] for the
//! platform API, and a [`sync::SyncService`] on top of both.

pub mod db;
pub mod entity;
#[cfg(feature = "migrate")]
pub mod migration;
pub mod platform;
pub mod repository;
pub mod retry;
pub mod store;
pub mod sync;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use platform::{CatalogClient, ClientFactory, PlatformError};
pub use store::{CatalogStore, ProductFields, SyncTarget};
pub use sync::{
    ProgressSnapshot, ProgressStore, RunStatus, StartedSync, SyncError, SyncOptions, SyncService,
};
