use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entity::product::{ActiveModel, Column, Entity as Product, Model};

use super::errors::{RepositoryError, Result};

/// Insert a new product.
///
/// # Errors
/// Returns `RepositoryError::Database` if the insert fails (e.g., natural key
/// conflict).
pub async fn insert(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    model.insert(db).await.map_err(RepositoryError::from)
}

/// Find a product by its UUID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>> {
    Product::find_by_id(id)
        .one(db)
        .await
        .map_err(RepositoryError::from)
}

/// Find a product by its natural key (connection_id + external_id).
pub async fn find_by_natural_key(
    db: &DatabaseConnection,
    connection_id: Uuid,
    external_id: i64,
) -> Result<Option<Model>> {
    Product::find()
        .filter(Column::ConnectionId.eq(connection_id))
        .filter(Column::ExternalId.eq(external_id))
        .one(db)
        .await
        .map_err(RepositoryError::from)
}

/// Find all products whose row ids are in `ids`.
pub async fn find_many_by_ids(db: &DatabaseConnection, ids: &[Uuid]) -> Result<Vec<Model>> {
    Product::find()
        .filter(Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await
        .map_err(RepositoryError::from)
}

/// Insert or update a product by its natural key (connection_id + external_id).
///
/// If a product with the same connection_id and external_id exists it is
/// updated in place, otherwise a new row is inserted. This is what makes
/// repeated syncs of the same external product idempotent.
pub async fn upsert(db: &DatabaseConnection, model: ActiveModel) -> Result<Model> {
    let connection_id = required_active_value("connection_id", &model.connection_id)?;
    let external_id = required_active_value("external_id", &model.external_id)?;

    let existing = find_by_natural_key(db, connection_id, external_id).await?;

    match existing {
        Some(existing) => {
            let mut update_model = model;
            update_model.id = Set(existing.id);
            update_model.update(db).await.map_err(RepositoryError::from)
        }
        None => {
            let mut insert_model = model;
            if insert_model.id.is_not_set() {
                insert_model.id = Set(Uuid::new_v4());
            }
            insert_model.insert(db).await.map_err(RepositoryError::from)
        }
    }
}

fn required_active_value<T: Clone + Into<sea_orm::Value>>(
    field: &str,
    value: &ActiveValue<T>,
) -> Result<T> {
    match value {
        ActiveValue::Set(value) | ActiveValue::Unchanged(value) => Ok(value.clone()),
        ActiveValue::NotSet => Err(RepositoryError::InvalidInput {
            message: format!("Missing required field: {}", field),
        }),
    }
}

/// Delete a product by its UUID.
///
/// Returns the number of rows deleted (0 or 1).
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<u64> {
    let result = Product::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use sea_orm::ActiveValue;

    use super::*;

    #[test]
    fn required_active_value_rejects_not_set() {
        let value: ActiveValue<i64> = ActiveValue::NotSet;
        let err = required_active_value("external_id", &value).unwrap_err();
        assert!(err.to_string().contains("external_id"));
    }

    #[test]
    fn required_active_value_accepts_set_and_unchanged() {
        assert_eq!(
            required_active_value("external_id", &ActiveValue::Set(42i64)).unwrap(),
            42
        );
        assert_eq!(
            required_active_value("external_id", &ActiveValue::Unchanged(7i64)).unwrap(),
            7
        );
    }
}
