use crate::db::repositories::FollowRepository;
use crate::db::DbPool;
use crate::error::{Error, Result};

/// Reads and mutates the follow graph.
///
/// `is_following` fails soft (a follow button must never take down a
/// page render); the counts fail hard because a wrong number on a
/// profile header is worse than an error.
pub struct SocialGraph {
    follows: FollowRepository,
}

impl SocialGraph {
    pub fn new(pool: DbPool) -> Self {
        Self {
            follows: FollowRepository::new(pool),
        }
    }

    /// Check if `follower_id` follows `following_id`. Returns `false`
    /// on missing ids or store failure.
    pub fn is_following(&self, follower_id: &str, following_id: &str) -> bool {
        if follower_id.is_empty() || following_id.is_empty() {
            return false;
        }
        match self.follows.exists(follower_id, following_id) {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(error = %e, "follow check failed, defaulting to not-following");
                false
            }
        }
    }

    pub fn following_count(&self, user_id: &str) -> Result<i64> {
        Ok(self.follows.following_count(user_id)?)
    }

    pub fn follower_count(&self, user_id: &str) -> Result<i64> {
        Ok(self.follows.follower_count(user_id)?)
    }

    /// Create a follow edge. Self-loops and duplicate edges are
    /// rejected here as well as by the schema.
    pub fn follow(&self, follower_id: &str, following_id: &str) -> Result<()> {
        if follower_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }
        if following_id.is_empty() {
            return Err(Error::InvalidInput("missing target user id".to_string()));
        }
        if follower_id == following_id {
            return Err(Error::InvalidInput(
                "users cannot follow themselves".to_string(),
            ));
        }
        if self.follows.exists(follower_id, following_id)? {
            return Err(Error::Conflict(format!(
                "already following {following_id}"
            )));
        }
        self.follows.insert(follower_id, following_id)?;
        Ok(())
    }

    /// Remove a follow edge. Removing an edge that does not exist is a
    /// reported error, not a silent no-op.
    pub fn unfollow(&self, follower_id: &str, following_id: &str) -> Result<()> {
        if follower_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }
        if following_id.is_empty() {
            return Err(Error::InvalidInput("missing target user id".to_string()));
        }
        let removed = self.follows.delete(follower_id, following_id)?;
        if removed == 0 {
            return Err(Error::NotFound("follow relationship not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::seeded_db;

    fn graph() -> SocialGraph {
        SocialGraph::new(seeded_db().pool.clone())
    }

    #[test]
    fn test_is_following_soft_check() {
        let graph = graph();
        assert!(graph.is_following("user_alice", "user_bob"));
        assert!(!graph.is_following("user_bob", "user_alice"));
        // Missing identity context is a safe false, never an error.
        assert!(!graph.is_following("", "user_bob"));
        assert!(!graph.is_following("user_alice", ""));
    }

    #[test]
    fn test_counts() {
        let graph = graph();
        assert_eq!(graph.following_count("user_alice").unwrap(), 2);
        assert_eq!(graph.follower_count("user_alice").unwrap(), 1);
        assert_eq!(graph.following_count("user_fern").unwrap(), 0);
    }

    #[test]
    fn test_follow_rejects_self_loop() {
        let graph = graph();
        let err = graph.follow("user_alice", "user_alice").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_follow_rejects_duplicate_edge() {
        let graph = graph();
        let err = graph.follow("user_alice", "user_bob").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_follow_requires_identity() {
        let graph = graph();
        assert!(matches!(
            graph.follow("", "user_bob").unwrap_err(),
            Error::NotAuthenticated
        ));
        assert!(matches!(
            graph.follow("user_alice", "").unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn test_follow_then_unfollow() {
        let graph = graph();
        graph.follow("user_fern", "user_alice").unwrap();
        assert!(graph.is_following("user_fern", "user_alice"));

        graph.unfollow("user_fern", "user_alice").unwrap();
        assert!(!graph.is_following("user_fern", "user_alice"));

        let err = graph.unfollow("user_fern", "user_alice").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
