use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during local store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Record not found.
    #[error("Not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepositoryError {
    /// Create a NotFound error for a UUID lookup.
    pub fn not_found_by_id(id: Uuid) -> Self {
        Self::NotFound {
            context: format!("id={}", id),
        }
    }

    /// Create a NotFound error for a natural key lookup.
    pub fn not_found_by_key(connection_id: Uuid, external_id: i64) -> Self {
        Self::NotFound {
            context: format!("connection={} external_id={}", connection_id, external_id),
        }
    }
}

/// Result type alias for local store operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
