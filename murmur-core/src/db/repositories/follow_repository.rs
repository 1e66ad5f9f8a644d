use anyhow::{Context, Result};
use rusqlite::ToSql;

use crate::db::repositories::repeat_vars;
use crate::db::DbPool;

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if an edge follower -> following exists
    pub fn exists(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND following_id = ?",
            (follower_id, following_id),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get following count
    pub fn following_count(&self, user_id: &str) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get follower count
    pub fn follower_count(&self, user_id: &str) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE following_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All users this user follows, in edge order
    pub fn following_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT following_id FROM follows WHERE follower_id = ? ORDER BY id")?;
        let ids = stmt
            .query_map([user_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Bounded sample of the users this user follows, in edge order.
    /// Not exhaustive for large graphs.
    pub fn following_sample(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT following_id FROM follows WHERE follower_id = ? ORDER BY id LIMIT ?",
        )?;
        let ids = stmt
            .query_map((user_id, limit as i64), |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Second-degree candidates: users followed by anyone in `first_degree`,
    /// grouped by followee and ordered by how many distinct first-degree
    /// members follow them. Excludes `user_id` and the first-degree set
    /// itself. Ties fall back to the store's grouping order (best-effort).
    pub fn second_degree(&self, first_degree: &[String], user_id: &str) -> Result<Vec<String>> {
        if first_degree.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.pool.get()?;
        let vars = repeat_vars(first_degree.len());
        let mut stmt = conn.prepare(&format!(
            "SELECT following_id
             FROM follows
             WHERE follower_id IN ({vars})
               AND following_id <> ?
               AND following_id NOT IN ({vars})
             GROUP BY following_id
             ORDER BY COUNT(DISTINCT follower_id) DESC"
        ))?;

        let mut params: Vec<&dyn ToSql> =
            first_degree.iter().map(|id| id as &dyn ToSql).collect();
        params.push(&user_id as &dyn ToSql);
        params.extend(first_degree.iter().map(|id| id as &dyn ToSql));

        let ids = stmt
            .query_map(params.as_slice(), |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Users who follow `user_id` but are not followed back, in edge order
    pub fn reverse_candidates(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT follower_id
             FROM follows
             WHERE following_id = ?
               AND follower_id NOT IN (
                   SELECT following_id FROM follows WHERE follower_id = ?
               )
             ORDER BY id",
        )?;
        let ids = stmt
            .query_map((user_id, user_id), |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Globally most-followed users (cold-start fallback source)
    pub fn most_followed(&self, exclude_user_id: &str, limit: usize) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT following_id
             FROM follows
             WHERE following_id <> ?
             GROUP BY following_id
             ORDER BY COUNT(*) DESC
             LIMIT ?",
        )?;
        let ids = stmt
            .query_map((exclude_user_id, limit as i64), |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Insert a follow edge
    pub fn insert(&self, follower_id: &str, following_id: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO follows (follower_id, following_id) VALUES (?, ?)",
            (follower_id, following_id),
        )
        .context("Failed to insert follow edge")?;
        Ok(())
    }

    /// Delete a follow edge, returning how many rows were removed
    pub fn delete(&self, follower_id: &str, following_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM follows WHERE follower_id = ? AND following_id = ?",
                (follower_id, following_id),
            )
            .context("Failed to delete follow edge")?;
        Ok(rows)
    }
}
