use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Per-request timeout for outbound fetches, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Origins allowed to call the API from a browser
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_quotes_base_url")]
    pub quotes_base_url: String,
    pub feeds: Vec<FeedSource>,
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; RSSFetcher/1.0; +https://example.com)".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn default_quotes_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

/// A named RSS/Atom endpoint contributing to the home layout.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
