//! Application configuration
//!
//! Loaded from `studyplan.toml`. Secrets are never stored in the file; each
//! section names the environment variables that hold them. The loaded config
//! is passed explicitly into every pipeline invocation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "studyplan.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub youtube: YoutubeConfig,

    #[serde(default)]
    pub repair: RepairSettings,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load config from an explicit path, or `studyplan.toml` in the working directory
    ///
    /// A missing default file yields the default config; a missing explicit
    /// path is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !config_path.exists() {
            if explicit {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

// =============================================================================
// Generative model backend
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// OpenAI-compatible API root (e.g. "https://api.openai.com/v1")
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    #[serde(default = "default_model_name")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_model_api_key_env")]
    pub api_key_env: String,

    /// Per-call ceiling; a slower call fails its stage
    #[serde(default = "default_model_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-4o".to_string()
}

fn default_model_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model_timeout_secs() -> u64 {
    300
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            model: default_model_name(),
            api_key_env: default_model_api_key_env(),
            timeout_secs: default_model_timeout_secs(),
        }
    }
}

impl ModelConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

// =============================================================================
// Video platform API
// =============================================================================

/// How a credential is picked from the pool for each call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialStrategyKind {
    #[default]
    Random,
    RoundRobin,
    Weighted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,

    /// Every environment variable whose name starts with this prefix joins the key pool
    #[serde(default = "default_youtube_key_prefix")]
    pub key_env_prefix: String,

    #[serde(default)]
    pub strategy: CredentialStrategyKind,

    /// Relative weights by environment variable name (weighted strategy only, default 1)
    #[serde(default)]
    pub weights: BTreeMap<String, u32>,

    #[serde(default = "default_youtube_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_region_code")]
    pub region_code: String,
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_youtube_key_prefix() -> String {
    "YOUTUBE_API_KEY".to_string()
}

fn default_youtube_timeout_secs() -> u64 {
    30
}

fn default_region_code() -> String {
    "US".to_string()
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            base_url: default_youtube_base_url(),
            key_env_prefix: default_youtube_key_prefix(),
            strategy: CredentialStrategyKind::default(),
            weights: BTreeMap::new(),
            timeout_secs: default_youtube_timeout_secs(),
            region_code: default_region_code(),
        }
    }
}

impl YoutubeConfig {
    /// Collect `(variable name, key)` pairs from the process environment
    pub fn resolve_keys(&self) -> Vec<(String, String)> {
        self.resolve_keys_from(std::env::vars())
    }

    /// Collect keys from an arbitrary variable source, sorted by variable name
    pub fn resolve_keys_from(
        &self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Vec<(String, String)> {
        let mut keys: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(name, value)| {
                name.starts_with(&self.key_env_prefix) && !value.trim().is_empty()
            })
            .collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        keys
    }

    pub fn weight_for(&self, var_name: &str) -> u32 {
        self.weights.get(var_name).copied().unwrap_or(1)
    }
}

// =============================================================================
// Resource repair
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairSettings {
    /// Search attempts per invalid resource
    #[serde(default = "default_max_search_attempts")]
    pub max_search_attempts: usize,

    /// Append a different suffix to the search phrase on each retry
    #[serde(default = "default_vary_query")]
    pub vary_query_per_attempt: bool,

    /// Resource category holding video links
    #[serde(default = "default_resource_category")]
    pub resource_category: String,
}

fn default_max_search_attempts() -> usize {
    5
}

fn default_vary_query() -> bool {
    true
}

fn default_resource_category() -> String {
    super::plan::VIDEO_CATEGORY.to_string()
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self {
            max_search_attempts: default_max_search_attempts(),
            vary_query_per_attempt: default_vary_query(),
            resource_category: default_resource_category(),
        }
    }
}

// =============================================================================
// Conversation store, server, logging
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory for per-participant history files
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Turns loaded as context for conversational continuations
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_recent_limit() -> usize {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: None,
            recent_limit: default_recent_limit(),
        }
    }
}

impl StoreConfig {
    /// Configured directory, else `<data dir>/studyplan/conversations`,
    /// else `.studyplan/conversations`
    pub fn resolved_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("studyplan").join("conversations"))
            .unwrap_or_else(|| PathBuf::from(".studyplan/conversations"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.model.model, "gpt-4o");
        assert_eq!(config.model.timeout_secs, 300);
        assert_eq!(config.repair.max_search_attempts, 5);
        assert_eq!(config.repair.resource_category, "YouTube");
        assert_eq!(config.store.recent_limit, 10);
        assert_eq!(config.youtube.strategy, CredentialStrategyKind::Random);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [repair]
            max_search_attempts = 3

            [youtube]
            strategy = "round-robin"
            "#,
        )
        .unwrap();
        assert_eq!(config.repair.max_search_attempts, 3);
        assert!(config.repair.vary_query_per_attempt);
        assert_eq!(config.youtube.strategy, CredentialStrategyKind::RoundRobin);
        assert_eq!(config.youtube.key_env_prefix, "YOUTUBE_API_KEY");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_resolve_keys_filters_and_sorts() {
        let config = YoutubeConfig::default();
        let vars = vec![
            ("YOUTUBE_API_KEY2".to_string(), "k2".to_string()),
            ("PATH".to_string(), "/bin".to_string()),
            ("YOUTUBE_API_KEY1".to_string(), "k1".to_string()),
            ("YOUTUBE_API_KEY3".to_string(), "  ".to_string()),
        ];
        let keys = config.resolve_keys_from(vars);
        assert_eq!(
            keys,
            vec![
                ("YOUTUBE_API_KEY1".to_string(), "k1".to_string()),
                ("YOUTUBE_API_KEY2".to_string(), "k2".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/studyplan.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studyplan.toml");
        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9100);
    }
}
