use std::collections::HashMap;

use anyhow::Result;
use rusqlite::params_from_iter;

use murmur_types::Image;

use crate::db::repositories::repeat_vars;
use crate::db::DbPool;

pub struct ImageRepository {
    pool: DbPool,
}

impl ImageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Images attached to one post
    pub fn for_post(&self, post_id: i64) -> Result<Vec<Image>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, post_id, storage_path, public_url FROM images WHERE post_id = ? ORDER BY id",
        )?;
        let images = stmt
            .query_map([post_id], |row| {
                Ok(Image {
                    id: row.get(0)?,
                    post_id: row.get(1)?,
                    storage_path: row.get(2)?,
                    public_url: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }

    /// Images for many posts in one grouped fetch, keyed by post id.
    /// Posts without images are simply absent from the map.
    pub fn for_posts(&self, post_ids: &[i64]) -> Result<HashMap<i64, Vec<Image>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, post_id, storage_path, public_url
             FROM images
             WHERE post_id IN ({})
             ORDER BY id",
            repeat_vars(post_ids.len())
        ))?;

        let mut grouped: HashMap<i64, Vec<Image>> = HashMap::new();
        let rows = stmt.query_map(params_from_iter(post_ids.iter()), |row| {
            Ok(Image {
                id: row.get(0)?,
                post_id: row.get(1)?,
                storage_path: row.get(2)?,
                public_url: row.get(3)?,
            })
        })?;
        for image in rows {
            let image = image?;
            grouped.entry(image.post_id).or_default().push(image);
        }
        Ok(grouped)
    }

    /// Storage paths of a post's images (for purging from object storage)
    pub fn storage_paths(&self, post_id: i64) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT storage_path FROM images WHERE post_id = ?")?;
        let paths = stmt
            .query_map([post_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths)
    }
}
