use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::connection::{ActiveModel, Column, Entity as Connection, Model};

use super::errors::{RepositoryError, Result};

/// Insert a new connection.
///
/// # Errors
/// Returns `RepositoryError::Database` if the insert fails (e.g., duplicate name).
pub async fn insert(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    model.insert(db).await.map_err(RepositoryError::from)
}

/// Find a connection by its UUID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>> {
    Connection::find_by_id(id)
        .one(db)
        .await
        .map_err(RepositoryError::from)
}

/// Find a connection by its unique name.
pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Model>> {
    Connection::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await
        .map_err(RepositoryError::from)
}

/// List all configured connections.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<Model>> {
    Connection::find().all(db).await.map_err(RepositoryError::from)
}
