//! Database layer for pitchboard.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use pitchboard_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt).await.map_err(db_error)
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None).await.map_err(db_error)
}

/// Map a sea-orm error onto [`AppError`].
///
/// Unique and foreign key violations become [`AppError::ConstraintViolation`]
/// so callers can translate them into domain errors; everything else is a
/// server-side [`AppError::Database`].
#[must_use]
pub fn db_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(
            SqlErr::UniqueConstraintViolation(msg) | SqlErr::ForeignKeyConstraintViolation(msg),
        ) => AppError::ConstraintViolation(msg),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_defaults_to_database() {
        let err = db_error(DbErr::Custom("connection reset".to_string()));
        assert!(matches!(err, AppError::Database(msg) if msg.contains("connection reset")));
    }

    #[test]
    fn test_db_error_record_not_found() {
        let err = db_error(DbErr::RecordNotFound("project".to_string()));
        assert!(err.is_server_error());
    }
}
