use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Row, ToSql};
use rusqlite::OptionalExtension;

use murmur_types::Post;

use crate::db::repositories::repeat_vars;
use crate::db::DbPool;

const POST_COLUMNS: &str =
    "id, author_id, parent_post_id, content, is_comment, like_count, comment_count, created_at";

fn map_post_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        parent_post_id: row.get(2)?,
        content: row.get(3)?,
        is_comment: row.get::<_, i64>(4)? != 0,
        like_count: row.get(5)?,
        comment_count: row.get(6)?,
        created_at: row.get::<_, String>(7)?.parse::<DateTime<Utc>>().unwrap(),
    })
}

/// Read side of the posts relation. Counter-affecting mutations live in
/// `EngagementService`, which bundles them with their counter updates.
pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a single post or comment by id
    pub fn get_by_id(&self, post_id: i64) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?"
        ))?;
        let post = stmt.query_row([post_id], map_post_row).optional()?;
        Ok(post)
    }

    /// Top-level posts by one author, newest first
    pub fn by_author(&self, author_id: &str, limit: i64) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE author_id = ? AND is_comment = 0
             ORDER BY created_at DESC
             LIMIT ?"
        ))?;
        let posts = stmt
            .query_map((author_id, limit), map_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Top-level posts by any of the given authors, newest first
    pub fn by_authors(&self, author_ids: &[String], limit: i64) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM posts
             WHERE is_comment = 0 AND author_id IN ({})
             ORDER BY created_at DESC
             LIMIT ?",
            POST_COLUMNS,
            repeat_vars(author_ids.len())
        ))?;

        let mut params: Vec<&dyn ToSql> = author_ids.iter().map(|id| id as &dyn ToSql).collect();
        params.push(&limit);

        let posts = stmt
            .query_map(params.as_slice(), map_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Top-level posts ranked by engagement score (likes + comments)
    pub fn top(&self, limit: i64) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE is_comment = 0
             ORDER BY (like_count + comment_count) DESC
             LIMIT ?"
        ))?;
        let posts = stmt
            .query_map([limit], map_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Top-level posts created at or after `since`, ranked by like count.
    /// Posts outside the window are excluded regardless of engagement.
    pub fn trending(&self, since: &DateTime<Utc>, limit: i64) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE is_comment = 0 AND created_at >= ?
             ORDER BY like_count DESC
             LIMIT ?"
        ))?;
        let posts = stmt
            .query_map((since.to_rfc3339(), limit), map_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// All comment rows in natural id order (one pass, unscoped — the
    /// tree builder indexes them by parent)
    pub fn all_comments(&self) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE is_comment = 1 ORDER BY id"
        ))?;
        let posts = stmt
            .query_map([], map_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Posts a user has liked, most recent like first
    pub fn liked_by(&self, user_id: &str, limit: i64) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.author_id, p.parent_post_id, p.content, p.is_comment,
                    p.like_count, p.comment_count, p.created_at
             FROM posts p
             JOIN likes l ON l.post_id = p.id
             WHERE l.user_id = ? AND p.is_comment = 0
             ORDER BY l.id DESC
             LIMIT ?",
        )?;
        let posts = stmt
            .query_map((user_id, limit), map_post_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Number of direct replies referencing this post
    pub fn count_children(&self, post_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE parent_post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::seeded_db;

    #[test]
    fn test_get_by_id() {
        let db = seeded_db();
        let repo = PostRepository::new(db.pool.clone());

        let post = repo.get_by_id(1).unwrap().expect("post 1 exists");
        assert_eq!(post.author_id, "user_alice");
        assert!(!post.is_comment);
        assert_eq!(post.like_count, 2);
        assert_eq!(post.comment_count, 2);

        assert!(repo.get_by_id(999).unwrap().is_none());
    }

    #[test]
    fn test_by_authors_excludes_comments_and_sorts_newest_first() {
        let db = seeded_db();
        let repo = PostRepository::new(db.pool.clone());

        let authors = vec!["user_alice".to_string(), "user_bob".to_string()];
        let posts = repo.by_authors(&authors, 30).unwrap();

        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        // Alice's comment (id 7) and Bob's comment (id 5) must not appear.
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_top_ranks_by_engagement_score() {
        let db = seeded_db();
        let repo = PostRepository::new(db.pool.clone());

        let posts = repo.top(10).unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();

        // Posts 1 and 3 tie at score 4; tie order is store-defined.
        assert_eq!(ids.len(), 4);
        assert!(ids[..2].contains(&1) && ids[..2].contains(&3));
        assert_eq!(ids[2], 2);
        assert_eq!(ids[3], 4);
    }

    #[test]
    fn test_trending_gates_on_window_before_ranking() {
        let db = seeded_db();
        let repo = PostRepository::new(db.pool.clone());

        // Window that starts after posts 1 and 2 were created: even
        // though post 1 has more likes than post 4, it is excluded.
        let since = "2026-01-11T00:00:00+00:00".parse().unwrap();
        let posts = repo.trending(&since, 10).unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_all_comments_in_id_order() {
        let db = seeded_db();
        let repo = PostRepository::new(db.pool.clone());

        let comments = repo.all_comments().unwrap();
        let ids: Vec<i64> = comments.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 6, 7, 8]);
        assert!(comments.iter().all(|c| c.is_comment));
    }

    #[test]
    fn test_liked_by_most_recent_like_first() {
        let db = seeded_db();
        let repo = PostRepository::new(db.pool.clone());

        let posts = repo.liked_by("user_alice", 10).unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        // Alice liked post 2 (like id 3) then post 3 (like id 4); her
        // like on comment 5 is filtered out of the post listing.
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_count_children() {
        let db = seeded_db();
        let repo = PostRepository::new(db.pool.clone());

        assert_eq!(repo.count_children(1).unwrap(), 2);
        assert_eq!(repo.count_children(5).unwrap(), 1);
        assert_eq!(repo.count_children(4).unwrap(), 0);
    }
}
