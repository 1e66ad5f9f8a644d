use anyhow::Result;

use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if a user has liked a post
    pub fn exists(&self, user_id: &str, post_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND post_id = ?",
            (user_id, post_id),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Count live like rows for a post (the denormalized
    /// `posts.like_count` must always agree with this)
    pub fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
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
    fn test_exists() {
        let db = seeded_db();
        let repo = LikeRepository::new(db.pool.clone());

        assert!(repo.exists("user_bob", 1).unwrap());
        assert!(!repo.exists("user_bob", 2).unwrap());
    }

    #[test]
    fn test_count_for_post_matches_seed_counters() {
        let db = seeded_db();
        let repo = LikeRepository::new(db.pool.clone());

        assert_eq!(repo.count_for_post(1).unwrap(), 2);
        assert_eq!(repo.count_for_post(3).unwrap(), 3);
        assert_eq!(repo.count_for_post(4).unwrap(), 0);
    }
}
