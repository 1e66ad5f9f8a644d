use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub path: String,
}

/// Feed ranking knobs: result caps per view and the trending recency
/// window.
#[derive(Debug, Clone, Deserialize)]
pub struct Feed {
    pub following_limit: usize,
    pub top_limit: usize,
    pub trending_limit: usize,
    pub trending_window_days: i64,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            following_limit: 30,
            top_limit: 30,
            trending_limit: 10,
            trending_window_days: 7,
        }
    }
}

/// Recommendation knobs: how many outgoing edges to sample as the
/// first-degree set, and the default result cap.
#[derive(Debug, Clone, Deserialize)]
pub struct Recommend {
    pub following_sample: usize,
    pub max_results: usize,
}

impl Default for Recommend {
    fn default() -> Self {
        Self {
            following_sample: 20,
            max_results: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub feed: Feed,
    pub recommend: Recommend,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables from .env file
        dotenv::dotenv().ok();

        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        // Check in current directory
        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in murmur-core directory (for development)
        let dev_path = PathBuf::from("murmur-core").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("database.path", "murmur.db")?
            .set_default("feed.following_limit", 30)?
            .set_default("feed.top_limit", 30)?
            .set_default("feed.trending_limit", 10)?
            .set_default("feed.trending_window_days", 7)?
            .set_default("recommend.following_sample", 20)?
            .set_default("recommend.max_results", 10)?;

        // 2. Override with environment variables (highest priority)
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(days) = std::env::var("TRENDING_WINDOW_DAYS") {
            builder = builder.set_override("feed.trending_window_days", days)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }
}
