//! Shared fixtures for unit tests: in-memory databases, the seed
//! identity directory, and raw row insertion helpers. Raw helpers
//! bypass `EngagementService` on purpose, so tests can stage exact
//! counter states (including drifted ones).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use murmur_types::Profile;

use crate::db::{Database, DbPool};
use crate::identity::InMemoryDirectory;

pub fn test_db() -> Database {
    let db = Database::in_memory().expect("Failed to create test database");
    db.initialize().expect("Failed to initialize schema");
    db
}

pub fn seeded_db() -> Database {
    let db = test_db();
    db.seed_test_data().expect("Failed to seed test data");
    db
}

/// Directory with the profiles the seed data refers to
pub fn directory() -> Arc<InMemoryDirectory> {
    let directory = InMemoryDirectory::new();
    for (id, username, full_name) in [
        ("user_alice", "alice", "Alice Rivers"),
        ("user_bob", "bob", "Bob Tan"),
        ("user_carol", "carol", "Carol Ng"),
        ("user_dana", "dana", "Dana Flores"),
        ("user_eli", "eli", "Eli Park"),
        ("user_fern", "fern", "Fern Okafor"),
    ] {
        directory.insert(Profile {
            id: id.to_string(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            image_url: Some(format!("https://cdn.murmur.dev/avatars/{username}.png")),
        });
    }
    Arc::new(directory)
}

/// Insert a top-level post row with explicit counters
pub fn insert_post(
    pool: &DbPool,
    author_id: &str,
    content: &str,
    like_count: i64,
    comment_count: i64,
    created_at: DateTime<Utc>,
) -> i64 {
    let conn = pool.get().expect("connection");
    conn.execute(
        "INSERT INTO posts (author_id, content, is_comment, like_count, comment_count, created_at)
         VALUES (?, ?, 0, ?, ?, ?)",
        (
            author_id,
            content,
            like_count,
            comment_count,
            created_at.to_rfc3339(),
        ),
    )
    .expect("insert post");
    conn.last_insert_rowid()
}

/// Insert a comment row without touching the parent's counter
pub fn insert_comment(pool: &DbPool, author_id: &str, parent_post_id: i64, content: &str) -> i64 {
    let conn = pool.get().expect("connection");
    conn.execute(
        "INSERT INTO posts (author_id, parent_post_id, content, is_comment, created_at)
         VALUES (?, ?, ?, 1, ?)",
        (author_id, parent_post_id, content, Utc::now().to_rfc3339()),
    )
    .expect("insert comment");
    conn.last_insert_rowid()
}
