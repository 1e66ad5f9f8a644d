use std::collections::HashMap;
use std::sync::Arc;

use murmur_types::Profile;

use crate::config::Recommend;
use crate::db::repositories::FollowRepository;
use crate::db::DbPool;
use crate::error::{Error, Result};
use crate::identity::IdentityProvider;

/// "Who to follow" candidate generation.
///
/// Candidates come from a two-hop walk over the follow graph: users
/// followed by the people the requester follows, ranked by how many of
/// those first-degree connections follow them, unioned with users who
/// already follow the requester. A user with no outgoing edges falls
/// back to the globally most-followed accounts.
pub struct RecommendationEngine {
    follows: FollowRepository,
    identity: Arc<dyn IdentityProvider>,
    settings: Recommend,
}

impl RecommendationEngine {
    pub fn new(pool: DbPool, identity: Arc<dyn IdentityProvider>, settings: Recommend) -> Self {
        Self {
            follows: FollowRepository::new(pool),
            identity,
            settings,
        }
    }

    /// Produce up to `limit` users to follow, excluding the requester
    /// and anyone already followed. An empty result is a valid,
    /// displayable state, not an error.
    pub fn recommend(&self, user_id: &str, limit: usize) -> Result<Vec<Profile>> {
        if user_id.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        // Bounded first-degree sample, in edge order. Not exhaustive
        // for large graphs.
        let first_degree = self
            .follows
            .following_sample(user_id, self.settings.following_sample)?;

        let mut candidates = if first_degree.is_empty() {
            // Cold start: fall back to globally popular accounts.
            self.follows.most_followed(user_id, limit)?
        } else {
            self.follows.second_degree(&first_degree, user_id)?
        };

        // Mutual-interest signal: followers not yet followed back.
        for id in self.follows.reverse_candidates(user_id)? {
            if !candidates.contains(&id) {
                candidates.push(id);
            }
        }

        candidates.retain(|id| id != user_id);
        candidates.truncate(limit);

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // One batched identity lookup; candidates the service cannot
        // resolve are dropped (an unresolvable account is not worth
        // recommending).
        let profiles = self.identity.get_users(&candidates)?;
        let mut by_id: HashMap<String, Profile> =
            profiles.into_iter().map(|p| (p.id.clone(), p)).collect();

        Ok(candidates
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }
}
