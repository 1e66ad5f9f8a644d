use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use murmur_types::{DeleteOutcome, Post, TOMBSTONE};

use crate::db::repositories::LikeRepository;
use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::storage::ObjectStore;

/// Write side of posts, comments, and likes.
///
/// Every counter-affecting mutation bundles the row change and the
/// counter update into one transaction, so a reader never observes a
/// like row without its counter (or vice versa). Image bytes go to the
/// object store outside the transaction: first on delete (nothing in
/// the store changes if the purge fails), last on create (the rows
/// recording the uploads commit after the uploads themselves).
pub struct EngagementService {
    pool: DbPool,
    storage: Arc<dyn ObjectStore>,
}

impl EngagementService {
    pub fn new(pool: DbPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    /// Create a top-level post, uploading any attached images
    pub fn create_post(
        &self,
        author_id: &str,
        content: &str,
        images: &[Vec<u8>],
    ) -> Result<Post> {
        if author_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("post content is empty".to_string()));
        }

        let created_at = Utc::now();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (author_id, content, is_comment, created_at)
             VALUES (?, ?, 0, ?)",
            (author_id, content, created_at.to_rfc3339()),
        )
        .context("Failed to create post")?;
        let post_id = conn.last_insert_rowid();
        drop(conn);

        self.attach_images(post_id, images)?;

        Ok(Post {
            id: post_id,
            author_id: author_id.to_string(),
            parent_post_id: None,
            content: content.to_string(),
            is_comment: false,
            like_count: 0,
            comment_count: 0,
            created_at,
        })
    }

    /// Attach a comment to a post or to another comment. The insert and
    /// the parent's counter increment commit together.
    pub fn add_comment(
        &self,
        author_id: &str,
        parent_post_id: i64,
        content: &str,
        images: &[Vec<u8>],
    ) -> Result<Post> {
        if author_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }
        if content.trim().is_empty() {
            return Err(Error::InvalidInput("comment content is empty".to_string()));
        }

        let created_at = Utc::now();
        let mut conn = self.pool.get()?;
        let tx = conn.transaction().context("Failed to open transaction")?;

        let parent: Option<i64> = tx
            .query_row(
                "SELECT id FROM posts WHERE id = ?",
                [parent_post_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up parent post")?;
        if parent.is_none() {
            return Err(Error::NotFound(format!("post {parent_post_id}")));
        }

        tx.execute(
            "INSERT INTO posts (author_id, parent_post_id, content, is_comment, created_at)
             VALUES (?, ?, ?, 1, ?)",
            (author_id, parent_post_id, content, created_at.to_rfc3339()),
        )
        .context("Failed to create comment")?;
        let comment_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE posts SET comment_count = comment_count + 1 WHERE id = ?",
            [parent_post_id],
        )
        .context("Failed to increment comment count")?;
        tx.commit().context("Failed to commit comment")?;
        drop(conn);

        self.attach_images(comment_id, images)?;

        Ok(Post {
            id: comment_id,
            author_id: author_id.to_string(),
            parent_post_id: Some(parent_post_id),
            content: content.to_string(),
            is_comment: true,
            like_count: 0,
            comment_count: 0,
            created_at,
        })
    }

    /// Like a post or comment. Duplicate likes conflict; the like row
    /// and the counter commit together.
    pub fn like(&self, user_id: &str, post_id: i64) -> Result<()> {
        if user_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction().context("Failed to open transaction")?;

        let exists: Option<i64> = tx
            .query_row("SELECT id FROM posts WHERE id = ?", [post_id], |row| {
                row.get(0)
            })
            .optional()
            .context("Failed to look up post")?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("post {post_id}")));
        }

        let already: Option<i64> = tx
            .query_row(
                "SELECT id FROM likes WHERE user_id = ? AND post_id = ?",
                (user_id, post_id),
                |row| row.get(0),
            )
            .optional()
            .context("Failed to check existing like")?;
        if already.is_some() {
            return Err(Error::Conflict(format!("post {post_id} already liked")));
        }

        tx.execute(
            "INSERT INTO likes (user_id, post_id) VALUES (?, ?)",
            (user_id, post_id),
        )
        .context("Failed to insert like")?;
        tx.execute(
            "UPDATE posts SET like_count = like_count + 1 WHERE id = ?",
            [post_id],
        )
        .context("Failed to increment like count")?;
        tx.commit().context("Failed to commit like")?;
        Ok(())
    }

    /// Remove a like. Unliking something never liked is a reported
    /// error, not a silent no-op.
    pub fn unlike(&self, user_id: &str, post_id: i64) -> Result<()> {
        if user_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction().context("Failed to open transaction")?;

        let removed = tx
            .execute(
                "DELETE FROM likes WHERE user_id = ? AND post_id = ?",
                (user_id, post_id),
            )
            .context("Failed to delete like")?;
        if removed == 0 {
            return Err(Error::NotFound(format!("like on post {post_id}")));
        }

        tx.execute(
            "UPDATE posts SET like_count = like_count - 1 WHERE id = ?",
            [post_id],
        )
        .context("Failed to decrement like count")?;
        tx.commit().context("Failed to commit unlike")?;
        Ok(())
    }

    /// Check if a user has liked a post. Fails soft: this gates only a
    /// UI affordance.
    pub fn is_liked(&self, user_id: &str, post_id: i64) -> bool {
        if user_id.is_empty() {
            return false;
        }
        match LikeRepository::new(self.pool.clone()).exists(user_id, post_id) {
            Ok(liked) => liked,
            Err(e) => {
                tracing::warn!(error = %e, "like check failed, defaulting to not-liked");
                false
            }
        }
    }

    /// Delete a top-level post
    pub fn delete_post(&self, actor_id: &str, post_id: i64) -> Result<DeleteOutcome> {
        self.delete(actor_id, post_id)
    }

    /// Delete a comment. Policy is identical to posts: a node with
    /// replies is tombstoned in place.
    pub fn delete_comment(&self, actor_id: &str, comment_id: i64) -> Result<DeleteOutcome> {
        self.delete(actor_id, comment_id)
    }

    fn delete(&self, actor_id: &str, post_id: i64) -> Result<DeleteOutcome> {
        if actor_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        let mut conn = self.pool.get()?;

        let target: Option<(String, bool, Option<i64>)> = conn
            .query_row(
                "SELECT author_id, is_comment, parent_post_id FROM posts WHERE id = ?",
                [post_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get::<_, i64>(1)? != 0,
                        row.get(2)?,
                    ))
                },
            )
            .optional()
            .context("Failed to look up post")?;
        let (author_id, is_comment, parent_post_id) = match target {
            Some(t) => t,
            None => return Err(Error::NotFound(format!("post {post_id}"))),
        };
        if author_id != actor_id {
            return Err(Error::NotAuthorized(
                "only the author can delete a post".to_string(),
            ));
        }

        let children: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM posts WHERE parent_post_id = ?",
                [post_id],
                |row| row.get(0),
            )
            .context("Failed to count replies")?;

        let paths: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT storage_path FROM images WHERE post_id = ?")
                .context("Failed to prepare image lookup")?;
            let paths = stmt
                .query_map([post_id], |row| row.get(0))
                .context("Failed to list images")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Failed to read image paths")?;
            paths
        };

        // Purge storage before touching rows: if removal fails the
        // database still matches the store.
        if !paths.is_empty() {
            self.storage.remove(&paths)?;
        }

        let tx = conn.transaction().context("Failed to open transaction")?;
        let outcome = if children > 0 {
            // Replies exist: tombstone in place so the tree stays
            // connected. The parent's counters are untouched.
            tx.execute(
                "UPDATE posts SET content = ? WHERE id = ?",
                (TOMBSTONE, post_id),
            )
            .context("Failed to tombstone post")?;
            tx.execute("DELETE FROM images WHERE post_id = ?", [post_id])
                .context("Failed to delete image rows")?;
            DeleteOutcome::Soft
        } else {
            tx.execute("DELETE FROM images WHERE post_id = ?", [post_id])
                .context("Failed to delete image rows")?;
            tx.execute("DELETE FROM likes WHERE post_id = ?", [post_id])
                .context("Failed to delete like rows")?;
            tx.execute("DELETE FROM posts WHERE id = ?", [post_id])
                .context("Failed to delete post")?;
            // Only the hard-delete path gives the parent its count back.
            if is_comment {
                if let Some(parent) = parent_post_id {
                    tx.execute(
                        "UPDATE posts SET comment_count = comment_count - 1 WHERE id = ?",
                        [parent],
                    )
                    .context("Failed to decrement comment count")?;
                }
            }
            DeleteOutcome::Hard
        };
        tx.commit().context("Failed to commit delete")?;
        Ok(outcome)
    }

    /// Upload image bytes under `posts/{post_id}/{uuid}` and record the
    /// rows, mirroring the storage layout
    fn attach_images(&self, post_id: i64, images: &[Vec<u8>]) -> Result<()> {
        if images.is_empty() {
            return Ok(());
        }

        let mut uploaded: Vec<(String, String)> = Vec::with_capacity(images.len());
        for bytes in images {
            let path = format!("posts/{}/{}", post_id, Uuid::new_v4());
            let url = self.storage.upload(&path, bytes)?;
            uploaded.push((path, url));
        }

        let conn = self.pool.get()?;
        for (path, url) in &uploaded {
            conn.execute(
                "INSERT INTO images (post_id, storage_path, public_url) VALUES (?, ?, ?)",
                (post_id, path, url),
            )
            .context("Failed to record image")?;
        }
        Ok(())
    }
}
