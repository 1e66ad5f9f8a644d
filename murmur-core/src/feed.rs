use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use murmur_types::{FeedItem, Post, Profile};

use crate::config::Feed;
use crate::db::repositories::{FollowRepository, ImageRepository, PostRepository};
use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::identity::IdentityProvider;

/// Cap for a profile page's own-post listing
const AUTHOR_FEED_LIMIT: i64 = 15;

/// Read-only post ranking for the feed views.
///
/// Every view batches its joins: one grouped image fetch and one
/// batched identity lookup per call, never one call per post. An
/// author the identity service does not know degrades to the
/// placeholder profile; an identity-service failure propagates.
pub struct FeedRanker {
    posts: PostRepository,
    images: ImageRepository,
    follows: FollowRepository,
    identity: Arc<dyn IdentityProvider>,
    settings: Feed,
}

impl FeedRanker {
    pub fn new(pool: DbPool, identity: Arc<dyn IdentityProvider>, settings: Feed) -> Self {
        Self {
            posts: PostRepository::new(pool.clone()),
            images: ImageRepository::new(pool.clone()),
            follows: FollowRepository::new(pool),
            identity,
            settings,
        }
    }

    /// Posts authored by the user or anyone they follow, newest first
    pub fn following_feed(&self, user_id: &str) -> Result<Vec<FeedItem>> {
        if user_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }
        let mut authors = self.follows.following_ids(user_id)?;
        authors.push(user_id.to_string());

        let posts = self
            .posts
            .by_authors(&authors, self.settings.following_limit as i64)?;
        self.hydrate(posts)
    }

    /// Posts ranked by engagement score (likes + comments)
    pub fn top_feed(&self) -> Result<Vec<FeedItem>> {
        let posts = self.posts.top(self.settings.top_limit as i64)?;
        self.hydrate(posts)
    }

    /// Posts from the trailing window ranked by like count. Recency
    /// gates, engagement ranks: a heavily liked post outside the
    /// window is excluded entirely.
    pub fn trending_feed(&self) -> Result<Vec<FeedItem>> {
        self.trending_feed_at(Utc::now())
    }

    /// Trending feed against an explicit "now" (testable variant)
    pub fn trending_feed_at(&self, now: DateTime<Utc>) -> Result<Vec<FeedItem>> {
        let since = now - Duration::days(self.settings.trending_window_days);
        let posts = self
            .posts
            .trending(&since, self.settings.trending_limit as i64)?;
        self.hydrate(posts)
    }

    /// A user's own top-level posts, newest first
    pub fn author_feed(&self, user_id: &str) -> Result<Vec<FeedItem>> {
        let posts = self.posts.by_author(user_id, AUTHOR_FEED_LIMIT)?;
        self.hydrate(posts)
    }

    /// One top-level post with its images and author; `Ok(None)` for
    /// unknown ids and for comments
    pub fn single_post(&self, post_id: i64) -> Result<Option<FeedItem>> {
        let post = match self.posts.get_by_id(post_id)? {
            Some(post) if !post.is_comment => post,
            _ => return Ok(None),
        };
        let mut items = self.hydrate(vec![post])?;
        Ok(items.pop())
    }

    /// Posts the user has liked, most recent like first
    pub fn liked_feed(&self, user_id: &str) -> Result<Vec<FeedItem>> {
        if user_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }
        let posts = self
            .posts
            .liked_by(user_id, self.settings.following_limit as i64)?;
        self.hydrate(posts)
    }

    /// Zip posts with their images (one grouped fetch) and authors
    /// (one batched identity lookup)
    fn hydrate(&self, posts: Vec<Post>) -> Result<Vec<FeedItem>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let mut images = self.images.for_posts(&post_ids)?;

        let mut author_ids: Vec<String> = Vec::new();
        for post in &posts {
            if !author_ids.contains(&post.author_id) {
                author_ids.push(post.author_id.clone());
            }
        }
        let profiles = self.identity.get_users(&author_ids)?;
        let by_id: HashMap<String, Profile> =
            profiles.into_iter().map(|p| (p.id.clone(), p)).collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let author = by_id.get(&post.author_id).cloned().unwrap_or_else(|| {
                    tracing::warn!(
                        author_id = %post.author_id,
                        post_id = post.id,
                        "author unknown to identity service, using placeholder"
                    );
                    Profile::placeholder(&post.author_id)
                });
                let images = images.remove(&post.id).unwrap_or_default();
                FeedItem {
                    post,
                    author,
                    images,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{directory, insert_post, seeded_db};
    use chrono::TimeZone;

    fn ranker(db: &crate::db::Database) -> FeedRanker {
        FeedRanker::new(db.pool.clone(), directory(), Feed::default())
    }

    #[test]
    fn test_following_feed_includes_own_and_followed_posts() {
        let db = seeded_db();
        let feed = ranker(&db).following_feed("user_alice").unwrap();

        // Alice follows Bob and Carol: her own post plus theirs, newest
        // first, comments excluded.
        let ids: Vec<i64> = feed.iter().map(|item| item.post.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_top_feed_orders_by_engagement() {
        let db = seeded_db();
        let feed = ranker(&db).top_feed().unwrap();

        let scores: Vec<i64> = feed.iter().map(|i| i.post.engagement_score()).collect();
        assert_eq!(scores.len(), 4);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_trending_window_gates_regardless_of_engagement() {
        let db = seeded_db();
        let ranker = ranker(&db);

        // Eight-day-old heavyweight vs a fresh lightweight.
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let old = insert_post(&db.pool, "user_bob", "old but mighty", 10, 0, now - Duration::days(8));
        let fresh = insert_post(&db.pool, "user_carol", "fresh", 1, 0, now - Duration::days(1));

        let feed = ranker.trending_feed_at(now).unwrap();
        let ids: Vec<i64> = feed.iter().map(|i| i.post.id).collect();

        assert!(ids.contains(&fresh));
        assert!(!ids.contains(&old));
        // Seed posts are from January and fall outside the window too.
        assert_eq!(ids, vec![fresh]);
    }

    #[test]
    fn test_trending_ranks_by_likes_within_window() {
        let db = seeded_db();
        let ranker = ranker(&db);

        let now = Utc.with_ymd_and_hms(2026, 1, 13, 0, 0, 0).unwrap();
        let feed = ranker.trending_feed_at(now).unwrap();
        let ids: Vec<i64> = feed.iter().map(|i| i.post.id).collect();

        // All seed posts are within 7 days of Jan 13; likes rank them.
        assert_eq!(ids, vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_hydration_attaches_images_and_authors() {
        let db = seeded_db();
        let feed = ranker(&db).top_feed().unwrap();

        let with_image = feed.iter().find(|i| i.post.id == 2).unwrap();
        assert_eq!(with_image.images.len(), 1);
        assert_eq!(with_image.author.username, "bob");

        let without_image = feed.iter().find(|i| i.post.id == 4).unwrap();
        assert!(without_image.images.is_empty());
    }

    #[test]
    fn test_unknown_author_degrades_to_placeholder() {
        let db = seeded_db();
        let now = Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap();
        insert_post(&db.pool, "user_ghost", "who wrote this?", 0, 0, now);

        let feed = ranker(&db).top_feed().unwrap();
        let ghost = feed
            .iter()
            .find(|i| i.post.author_id == "user_ghost")
            .expect("ghost post is still ranked");
        assert_eq!(ghost.author.username, "unknown");
        assert_eq!(ghost.author.full_name, "Unknown User");
    }

    #[test]
    fn test_author_feed_capped_and_newest_first() {
        let db = seeded_db();
        let feed = ranker(&db).author_feed("user_alice").unwrap();
        let ids: Vec<i64> = feed.iter().map(|i| i.post.id).collect();
        // Post 1 only: comments are not part of a profile listing.
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_single_post_excludes_comments() {
        let db = seeded_db();
        let ranker = ranker(&db);

        let item = ranker.single_post(2).unwrap().expect("post 2 exists");
        assert_eq!(item.images.len(), 1);

        assert!(ranker.single_post(5).unwrap().is_none()); // a comment
        assert!(ranker.single_post(999).unwrap().is_none());
    }

    #[test]
    fn test_liked_feed() {
        let db = seeded_db();
        let feed = ranker(&db).liked_feed("user_alice").unwrap();
        let ids: Vec<i64> = feed.iter().map(|i| i.post.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
