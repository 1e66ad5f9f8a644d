use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;

/// External object storage for post images. Only the create/delete
/// paths touch it; ranking and recommendation never do.
pub trait ObjectStore: Send + Sync {
    /// Upload bytes under `path` and return the public URL
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<String>;

    /// Remove objects. Unknown paths are ignored (removal is idempotent).
    fn remove(&self, paths: &[String]) -> Result<()>;
}

/// In-memory store used in tests and local development.
pub struct MemoryObjectStore {
    base_url: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("memory://media")
    }
}

impl ObjectStore for MemoryObjectStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<String> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(format!("{}/{}", self.base_url, path))
    }

    fn remove(&self, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }
}
