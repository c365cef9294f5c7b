use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the generative API credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
    /// Maximum number of candidates sent to the chronicler
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "default_entries_per_feed")]
    pub entries_per_feed: usize,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Timeout for each feed request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn feed(name: &str, url: &str) -> FeedConfig {
    FeedConfig {
        name: name.to_string(),
        url: url.to_string(),
    }
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        feed("ScienceDaily", "https://www.sciencedaily.com/rss/top/science.xml"),
        feed("The Verge", "https://www.theverge.com/rss/index.xml"),
        feed("BBC World", "http://feeds.bbci.co.uk/news/world/rss.xml"),
        feed("CNBC Business", "https://www.cnbc.com/id/100003114/device/rss/rss.html"),
    ]
}

fn default_candidate_limit() -> usize {
    5
}

fn default_entries_per_feed() -> usize {
    2
}

fn default_summary_max_chars() -> usize {
    300
}

fn default_output_path() -> PathBuf {
    PathBuf::from("news.json")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            candidate_limit: default_candidate_limit(),
            entries_per_feed: default_entries_per_feed(),
            summary_max_chars: default_summary_max_chars(),
            output_path: default_output_path(),
            fetch_timeout_secs: default_timeout_secs(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in feeds.
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(content) => Self::from_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Credential for the generative API, checked once at startup.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::MissingApiKey(API_KEY_VAR));
        }
        Ok(Self(key))
    }

    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_VAR).map_err(|_| Error::MissingApiKey(API_KEY_VAR))?;
        Self::new(key)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}
