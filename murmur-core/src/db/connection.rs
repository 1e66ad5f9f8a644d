use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;
use uuid::Uuid;

use super::schema::{SCHEMA, TEST_DATA};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool backed by a file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(init_connection);
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create an in-memory database pool (useful for testing)
    ///
    /// Uses a uniquely named shared-cache database so every pooled
    /// connection sees the same data while each call still gets an
    /// isolated instance.
    pub fn in_memory() -> Result<Self> {
        let uri = format!("file:murmur-mem-{}?mode=memory&cache=shared", Uuid::new_v4());
        let manager = SqliteConnectionManager::file(uri)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_init(init_connection);
        let pool =
            Pool::new(manager).context("Failed to create in-memory database connection pool")?;
        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Seed the database with test data
    pub fn seed_test_data(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(TEST_DATA)
            .context("Failed to seed test data")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

fn init_connection(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        // Verify tables exist
        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        assert!(tables.contains(&"posts".to_string()));
        assert!(tables.contains(&"images".to_string()));
        assert!(tables.contains(&"likes".to_string()));
        assert!(tables.contains(&"follows".to_string()));
    }

    #[test]
    fn test_pooled_connections_share_in_memory_database() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        // Two distinct pooled connections must see the same schema.
        let first = db.connection().expect("first connection");
        let second = db.connection().expect("second connection");

        first
            .execute(
                "INSERT INTO posts (author_id, content, is_comment, created_at)
                 VALUES ('user_alice', 'visible everywhere', 0, '2026-01-01T00:00:00+00:00')",
                [],
            )
            .expect("insert through first connection");

        let count: i64 = second
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .expect("count through second connection");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_seed_test_data() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_test_data().expect("Failed to seed test data");

        let conn = db.connection().expect("Failed to get connection");
        let posts: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .expect("Failed to count posts");
        let follows: i64 = conn
            .query_row("SELECT COUNT(*) FROM follows", [], |row| row.get(0))
            .expect("Failed to count follows");

        assert_eq!(posts, 8);
        assert_eq!(follows, 7);
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("murmur-test.db");

        let db = Database::new(&path).expect("Failed to create file database");
        db.initialize().expect("Failed to initialize file schema");
        assert!(path.exists());
    }

    #[test]
    fn test_schema_rejects_self_follow() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let conn = db.connection().expect("Failed to get connection");
        let result = conn.execute(
            "INSERT INTO follows (follower_id, following_id) VALUES ('user_alice', 'user_alice')",
            [],
        );
        assert!(result.is_err());
    }
}
