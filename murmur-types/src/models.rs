use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content substituted for a deleted post that still has replies, so the
/// discussion tree stays connected.
pub const TOMBSTONE: &str = "[deleted]";

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A post or a comment. Comments are posts with `is_comment` set and a
/// parent reference into the same relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    /// Identity-service user id of the author.
    pub author_id: String,
    /// Parent post for comments (None for top-level posts)
    #[serde(default)]
    pub parent_post_id: Option<i64>,
    pub content: String,
    pub is_comment: bool,
    /// Denormalized count of live like rows referencing this post.
    pub like_count: i64,
    /// Denormalized count of live child posts referencing this post.
    pub comment_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Engagement score used by the "top" feed ranking.
    pub fn engagement_score(&self) -> i64 {
        self.like_count + self.comment_count
    }

    pub fn is_tombstoned(&self) -> bool {
        self.content == TOMBSTONE
    }
}

/// An uploaded image owned by exactly one post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub post_id: i64,
    pub storage_path: String,
    pub public_url: String,
}

/// One user's like on one post or comment. Unique per (user, post).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: String,
    pub post_id: i64,
}

/// Directed edge in the social graph: follower -> following.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEdge {
    pub id: i64,
    pub follower_id: String,
    pub following_id: String,
}

/// User profile resolved from the external identity service. Not owned
/// by the murmur store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Profile {
    /// Fallback identity for authors the identity service cannot resolve.
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            username: "unknown".to_string(),
            full_name: "Unknown User".to_string(),
            image_url: None,
        }
    }
}

/// A ranked feed entry: a post together with its resolved author and
/// attached images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub post: Post,
    pub author: Profile,
    pub images: Vec<Image>,
}

/// One node of a rendered discussion tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    pub post: Post,
    pub author: Profile,
    pub images: Vec<Image>,
    pub replies: Vec<CommentNode>,
}

/// How a delete was applied: tombstoned in place (replies exist) or the
/// row removed entirely (leaf).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Soft,
    Hard,
}
