//! Database connection utilities.

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Pragmas applied to every SQLite connection.
///
/// WAL keeps readers from blocking the sync engine's writers, the busy
/// timeout rides out short lock contention instead of failing, and NORMAL
/// synchronous is safe in combination with WAL.
const SQLITE_PRAGMAS: &[&str] = &[
    "PRAGMA journal_mode=WAL",
    "PRAGMA busy_timeout=5000",
    "PRAGMA synchronous=NORMAL",
];

async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    for pragma in SQLITE_PRAGMAS {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            (*pragma).to_string(),
        ))
        .await?;
    }
    Ok(())
}

/// Establish a connection to the local store.
///
/// SQLite URLs additionally get the pragmas in [`SQLITE_PRAGMAS`] applied.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if database_url.starts_with("sqlite://") || database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Establish a connection and run all pending migrations.
///
/// This is the recommended way to initialize the store for applications
/// embedding the sync engine; it keeps the schema up to date on startup.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or a migration
/// fails.
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn configure_sqlite_runs_every_pragma() {
        let exec_results = SQLITE_PRAGMAS.iter().map(|_| MockExecResult {
            rows_affected: 0,
            last_insert_id: 0,
        });
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results(exec_results)
            .into_connection();

        configure_sqlite(&db)
            .await
            .expect("mock sqlite pragma execs should succeed");
    }

    #[tokio::test]
    async fn connect_rejects_unparseable_database_url() {
        connect("not-a-database-url")
            .await
            .expect_err("invalid URL should error");
    }
}
