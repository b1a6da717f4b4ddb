use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::scoring::{FilterConfig, FormatPreference};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub filters: FilterDefaults,
    #[serde(default)]
    pub output: OutputConfig,
}

/// MusicBrainz catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Base URL of the web service.
    #[serde(default = "default_catalog_url")]
    pub base_url: String,
    /// User-Agent string (required by MusicBrainz).
    /// Format: "AppName/Version ( contact@example.com )"
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Minimum interval between two outbound requests, in milliseconds.
    #[serde(default = "default_min_interval")]
    pub min_interval_ms: u64,
    /// Maximum artists returned by a search.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            user_agent: default_user_agent(),
            min_interval_ms: default_min_interval(),
            search_limit: default_search_limit(),
            timeout_secs: default_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl CatalogConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

fn default_catalog_url() -> String {
    "https://musicbrainz.org/ws/2".to_string()
}

fn default_user_agent() -> String {
    format!(
        "albumhunt/{} ( https://github.com/albumhunt/albumhunt )",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_min_interval() -> u64 {
    1000
}

fn default_search_limit() -> u32 {
    25
}

/// Retry policy for transient catalog failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Additional attempts after the first one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Upper bound on the backoff delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    2000
}

fn default_max_delay() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `attempt` (1-based): doubles from the
    /// initial delay and saturates at the configured maximum.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(32);
        let ms = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// slskd source network configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// slskd server URL (e.g., "http://localhost:5030")
    pub url: String,
    /// slskd API key
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Poll controller tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Delay between two ticks, in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Hard ceiling on ticks before a forced fetch.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
    /// Consecutive stable ticks required before fetching responses.
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    /// Fetch retries when the service claims responses but returns none.
    #[serde(default = "default_max_fetch_retries")]
    pub max_fetch_retries: u32,
}

fn default_tick_interval() -> u64 {
    500
}

fn default_max_polls() -> u32 {
    120
}

fn default_stability_threshold() -> u32 {
    6
}

fn default_max_fetch_retries() -> u32 {
    20
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            max_polls: default_max_polls(),
            stability_threshold: default_stability_threshold(),
            max_fetch_retries: default_max_fetch_retries(),
        }
    }
}

impl PollConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Initial filter settings for a new session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterDefaults {
    #[serde(default)]
    pub format: FormatPreference,
    #[serde(default = "default_true")]
    pub require_free_slot: bool,
    #[serde(default = "default_true")]
    pub require_track_count: bool,
    #[serde(default = "default_true")]
    pub albums_only: bool,
    #[serde(default = "default_true")]
    pub dedup_releases: bool,
    /// National country code ranked right after worldwide releases.
    #[serde(default = "default_country")]
    pub preferred_country: String,
}

fn default_true() -> bool {
    true
}

fn default_country() -> String {
    "US".to_string()
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            format: FormatPreference::default(),
            require_free_slot: true,
            require_track_count: true,
            albums_only: true,
            dedup_releases: true,
            preferred_country: default_country(),
        }
    }
}

impl From<&FilterDefaults> for FilterConfig {
    fn from(defaults: &FilterDefaults) -> Self {
        FilterConfig {
            format: defaults.format,
            require_free_slot: defaults.require_free_slot,
            require_track_count: defaults.require_track_count,
            albums_only: defaults.albums_only,
            dedup_releases: defaults.dedup_releases,
        }
    }
}

/// Where the acquisition record goes besides stdout.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[source]
url = "http://localhost:5030"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.source.url, "http://localhost:5030");
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.catalog.min_interval_ms, 1000);
        assert_eq!(config.catalog.timeout_secs, 30);
        assert_eq!(config.catalog.retry.max_retries, 3);
        assert_eq!(config.poll.tick_interval_ms, 500);
        assert_eq!(config.poll.max_polls, 120);
        assert_eq!(config.poll.stability_threshold, 6);
        assert_eq!(config.poll.max_fetch_retries, 20);
        assert_eq!(config.filters.format, FormatPreference::Lossless);
        assert!(config.filters.require_free_slot);
        assert!(config.output.record_path.is_none());
    }

    #[test]
    fn test_deserialize_missing_source_fails() {
        let toml = r#"
[catalog]
min_interval_ms = 1500
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_filter_overrides() {
        let toml = r#"
[source]
url = "http://localhost:5030"
api_key = "secret"

[filters]
format = "either"
require_free_slot = false
preferred_country = "GB"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.filters.format, FormatPreference::Either);
        assert!(!config.filters.require_free_slot);
        assert!(config.filters.require_track_count);
        assert_eq!(config.filters.preferred_country, "GB");

        let filters = FilterConfig::from(&config.filters);
        assert_eq!(filters.format, FormatPreference::Either);
        assert!(!filters.require_free_slot);
        assert!(filters.dedup_releases);
    }

    #[test]
    fn test_deserialize_catalog_overrides() {
        let toml = r#"
[source]
url = "http://localhost:5030"

[catalog]
timeout_secs = 10
search_limit = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.timeout_secs, 10);
        assert_eq!(config.catalog.search_limit, 5);
        assert_eq!(config.catalog.min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(1), Duration::from_secs(2));
        assert_eq!(retry.delay_for(2), Duration::from_secs(4));
        assert_eq!(retry.delay_for(3), Duration::from_secs(8));
        assert_eq!(retry.delay_for(5), Duration::from_secs(30));
        assert_eq!(retry.delay_for(60), Duration::from_secs(30));
    }
}
