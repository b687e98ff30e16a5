//! Test utilities for database operations.
//!
//! Connects to (or creates) a migrated `PostgreSQL` test database and seeds
//! the rows vote tests need. Connection details come from the
//! `STORYHUB_TEST_DB_*` environment variables.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use storyhub_common::IdGenerator;
use tracing::info;

use crate::entities::{comment, story, user};
use crate::migrations::Migrator;

/// Tables in delete order (children before parents).
const TABLES: [&str; 4] = ["vote", "comment", "story", "user"];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("STORYHUB_TEST_DB_HOST", "localhost"),
            port: std::env::var("STORYHUB_TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("STORYHUB_TEST_DB_USER", "storyhub_test"),
            password: env_or("STORYHUB_TEST_DB_PASSWORD", "storyhub_test"),
            database: env_or("STORYHUB_TEST_DB_NAME", "storyhub_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of the test database itself.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// URL of the server's `postgres` database, used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the shared test database and apply migrations.
    pub async fn new() -> Result<Self, DbErr> {
        Self::with_config(TestDbConfig::default()).await
    }

    /// Connect with a custom configuration and apply migrations.
    pub async fn with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");
        Ok(Self { conn, config })
    }

    /// Create a fresh, uniquely named database so tests can run in parallel.
    ///
    /// Call [`drop_database`](Self::drop_database) when done.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        config.database = format!("storyhub_test_{}", IdGenerator::new().generate_suffix());

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        Self::with_config(config).await
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Remove every row, keeping the schema.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let tables = TABLES
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("TRUNCATE TABLE {tables} CASCADE"),
            ))
            .await?;

        info!("Cleaned up test database");
        Ok(())
    }

    /// Drop the database created by [`create_unique`](Self::create_unique).
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let admin = Database::connect(&self.config.postgres_url()).await?;
        // Stray pool connections would block the drop.
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.config.database
                ),
            ))
            .await
            .ok();
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }

    /// Insert a user.
    pub async fn insert_user(&self, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            username: Set(username.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a story with zeroed stats.
    pub async fn insert_story(&self, author_id: &str, slug: &str) -> Result<story::Model, DbErr> {
        story::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            author_id: Set(author_id.to_string()),
            title: Set(slug.replace('-', " ")),
            slug: Set(slug.to_string()),
            body: Set("Test body".to_string()),
            upvote_count: Set(0),
            downvote_count: Set(0),
            vote_count: Set(0),
            vote_score: Set(0.0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a top-level comment with zeroed stats.
    pub async fn insert_comment(
        &self,
        story_id: &str,
        author_id: &str,
    ) -> Result<comment::Model, DbErr> {
        comment::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            story_id: Set(story_id.to_string()),
            parent_id: Set(None),
            author_id: Set(author_id.to_string()),
            body: Set("Test comment".to_string()),
            depth: Set(0),
            upvote_count: Set(0),
            downvote_count: Set(0),
            vote_count: Set(0),
            vote_score: Set(0.0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.conn)
        .await
    }
}
