//! Common re-exports for convenient entity usage.

pub use super::connection::{
    ActiveModel as ConnectionActiveModel, Column as ConnectionColumn, Entity as Connection,
    Model as ConnectionModel,
};
pub use super::product::{
    ActiveModel as ProductActiveModel, Column as ProductColumn, Entity as Product,
    Model as ProductModel,
};
