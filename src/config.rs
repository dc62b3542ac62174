//! Configuration file parser for ~/.config/folio/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
//!
//! Secrets may also come from the environment, which takes precedence:
//! `GITHUB_TOKEN` (or `VITE_GITHUB_TOKEN`) and `GEMINI_API_KEY`.
use crate::github::{BodyFailurePolicy, PostsLocation};
use crate::projects::ProjectFilter;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

const GITHUB_TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "VITE_GITHUB_TOKEN"];
const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

const KNOWN_KEYS: [&str; 18] = [
    "github_username",
    "articles_repo",
    "posts_path",
    "branch",
    "api_base",
    "web_base",
    "portfolio_topics",
    "repo_whitelist",
    "project_limit",
    "request_timeout_secs",
    "body_failure",
    "github_token",
    "gemini_api_key",
    "gemini_model",
    "gemini_base",
    "analysis_output",
    "analysis_delay_ms",
    "reader_back_to_top_rows",
];

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Secrets are wrapped in `SecretString`, whose `Debug` output is redacted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Owner of both the articles repository and the showcased projects.
    pub github_username: String,
    pub articles_repo: String,
    /// Directory inside `articles_repo` that holds the markdown posts.
    pub posts_path: String,
    /// Branch used for permalinks when the listing omits `html_url`.
    pub branch: String,
    pub api_base: String,
    pub web_base: String,

    /// Repositories must carry one of these topics to be showcased (empty = any).
    pub portfolio_topics: Vec<String>,
    /// Exact repository names to showcase (empty = any).
    pub repo_whitelist: Vec<String>,
    pub project_limit: usize,

    pub request_timeout_secs: u64,
    pub body_failure: BodyFailurePolicy,

    #[serde(deserialize_with = "deserialize_secret")]
    pub github_token: Option<SecretString>,
    #[serde(deserialize_with = "deserialize_secret")]
    pub gemini_api_key: Option<SecretString>,
    pub gemini_model: String,
    pub gemini_base: String,
    pub analysis_output: PathBuf,
    /// Pause between model calls, to stay under the API rate limit.
    pub analysis_delay_ms: u64,

    /// Rows scrolled before the reader shows its back-to-top hint.
    pub reader_back_to_top_rows: u16,
}

/// Blank secrets count as unset.
fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(SecretString::from))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_username: "liohunter1".to_string(),
            articles_repo: "MyArticles-Blogs".to_string(),
            posts_path: "posts".to_string(),
            branch: "main".to_string(),
            api_base: "https://api.github.com".to_string(),
            web_base: "https://github.com".to_string(),
            portfolio_topics: vec!["portfolio".to_string()],
            repo_whitelist: Vec::new(),
            project_limit: 10,
            request_timeout_secs: 30,
            body_failure: BodyFailurePolicy::FailBatch,
            github_token: None,
            gemini_api_key: None,
            gemini_model: "gemini-1.5-flash-latest".to_string(),
            gemini_base: "https://generativelanguage.googleapis.com".to_string(),
            analysis_output: PathBuf::from("src/data/analyzed-content.json"),
            analysis_delay_ms: 1000,
            reader_back_to_top_rows: 15,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text (blank text yields defaults).
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            user = %config.github_username,
            repo = %config.articles_repo,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Overlay secrets from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = GITHUB_TOKEN_VARS.iter().find_map(|k| non_empty(k)) {
            self.github_token = Some(SecretString::from(token));
        }
        if let Some(key) = non_empty(GEMINI_KEY_VAR) {
            self.gemini_api_key = Some(SecretString::from(key));
        }
        self
    }

    pub fn posts_location(&self) -> PostsLocation {
        PostsLocation {
            owner: self.github_username.clone(),
            repo: self.articles_repo.clone(),
            path: self.posts_path.clone(),
            branch: self.branch.clone(),
            web_base: self.web_base.clone(),
        }
    }

    pub fn project_filter(&self) -> ProjectFilter {
        ProjectFilter {
            topics: self.portfolio_topics.clone(),
            whitelist: self.repo_whitelist.clone(),
            limit: self.project_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn analysis_delay(&self) -> Duration {
        Duration::from_millis(self.analysis_delay_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================
