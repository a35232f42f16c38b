//! SeaORM entity definitions for the shopsync database schema.

pub mod connection;
pub mod prelude;
pub mod product;
