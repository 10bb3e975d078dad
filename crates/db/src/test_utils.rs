//! Scratch `PostgreSQL` databases for integration tests.
//!
//! Each [`TestDatabase`] is created under a random name, migrated, and shared
//! through an `Arc` so repositories and services can hold the same pool the
//! test body uses. Call [`TestDatabase::drop_database`] at the end of a test.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::migrations::Migrator;

/// Where the test server lives, read from `TEST_DB_*` variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Server host (`TEST_DB_HOST`).
    pub host: String,
    /// Server port (`TEST_DB_PORT`).
    pub port: u16,
    /// Role with `CREATEDB` (`TEST_DB_USER`).
    pub username: String,
    /// Role password (`TEST_DB_PASSWORD`).
    pub password: String,
    /// Database name (`TEST_DB_NAME`).
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        let var = |key: &str, fallback: &str| {
            std::env::var(key).unwrap_or_else(|_| fallback.to_string())
        };

        Self {
            host: var("TEST_DB_HOST", "localhost"),
            port: var("TEST_DB_PORT", "5433").parse().unwrap_or(5433),
            username: var("TEST_DB_USER", "pitchboard_test"),
            password: var("TEST_DB_PASSWORD", "pitchboard_test"),
            database: var("TEST_DB_NAME", "pitchboard_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of `database` on the configured server.
    #[must_use]
    pub fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }

    /// URL of the configured database.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// Run one statement against the `postgres` maintenance database.
    async fn admin(&self, sql: String) -> Result<(), DbErr> {
        let conn = Database::connect(&self.url_for("postgres")).await?;
        let result = conn.execute_unprepared(&sql).await;
        conn.close().await?;
        result.map(|_| ())
    }
}

/// A migrated database shared by a test and the services under test.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
    config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to an existing database and bring its schema up to date.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");
        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Create a database with a random name and migrate it.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("pitchboard_test_{}", &suffix[..12]);

        config
            .admin(format!("CREATE DATABASE \"{}\"", config.database))
            .await?;
        info!(database = %config.database, "Created test database");

        Self::with_config(config).await
    }

    /// A handle to the shared connection pool.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Drop the database created by [`Self::create_unique`].
    ///
    /// Handles still held elsewhere keep their pool open; their sessions are
    /// terminated before the drop.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        let Self { conn, config } = self;
        match Arc::try_unwrap(conn) {
            Ok(conn) => conn.close().await?,
            Err(_) => warn!(database = %config.database, "Connection still shared at drop"),
        }

        config
            .admin(format!(
                "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
                 WHERE datname = '{}' AND pid <> pg_backend_pid()",
                config.database
            ))
            .await?;
        config
            .admin(format!("DROP DATABASE IF EXISTS \"{}\"", config.database))
            .await?;

        info!(database = %config.database, "Dropped test database");
        Ok(())
    }
}
