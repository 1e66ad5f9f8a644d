use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

use murmur_types::Profile;

/// External identity/auth service. Profiles are not stored in the
/// murmur store; feed rendering batches lookups through `get_users` to
/// avoid one call per post.
pub trait IdentityProvider: Send + Sync {
    /// Resolve a single user id. `Ok(None)` means the id is unknown to
    /// the service, which callers treat per their own policy
    /// (placeholder in rendering paths).
    fn get_user(&self, id: &str) -> Result<Option<Profile>>;

    /// Batched lookup. Unknown ids are simply absent from the result;
    /// order is unspecified.
    fn get_users(&self, ids: &[String]) -> Result<Vec<Profile>>;

    /// Username substring search, exact match first
    fn search_users(&self, username_filter: &str, limit: usize) -> Result<Vec<Profile>>;
}

/// In-memory directory used in tests and local development.
#[derive(Default)]
pub struct InMemoryDirectory {
    profiles: Mutex<HashMap<String, Profile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
    }
}

impl IdentityProvider for InMemoryDirectory {
    fn get_user(&self, id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(id).cloned())
    }

    fn get_users(&self, ids: &[String]) -> Result<Vec<Profile>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
    }

    fn search_users(&self, username_filter: &str, limit: usize) -> Result<Vec<Profile>> {
        let filter = username_filter.to_lowercase();
        let profiles = self.profiles.lock().unwrap();
        let mut results: Vec<Profile> = profiles
            .values()
            .filter(|p| p.username.to_lowercase().contains(&filter))
            .cloned()
            .collect();

        // Exact match first, then alphabetical
        results.sort_by(|a, b| {
            let a_exact = a.username.to_lowercase() == filter;
            let b_exact = b.username.to_lowercase() == filter;
            match (a_exact, b_exact) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => a.username.cmp(&b.username),
            }
        });

        results.truncate(limit);
        Ok(results)
    }
}
