//! Configuration types for node-crawler

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Main configuration for a crawl run
///
/// Every field has a default, so an empty JSON object (or no config file at
/// all) targets the production site.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target site layout and link conventions
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP behaviour (timeouts, identities, pacing, retry)
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Where the artifact and status record are written
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults. The result is validated
    /// before it is returned.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.site.base_url)
            .map_err(|e| Error::config("site.base_url", format!("invalid URL: {}", e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(
                "site.base_url",
                format!("scheme '{}' is not http or https", base.scheme()),
            ));
        }
        if self.site.allowed_domains.is_empty() {
            return Err(Error::config(
                "site.allowed_domains",
                "at least one allowed domain is required",
            ));
        }
        for (key, ext) in [
            ("site.resource_extension", &self.site.resource_extension),
            ("site.document_extension", &self.site.document_extension),
        ] {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(Error::config(
                    key,
                    format!("extension '{}' must start with a dot", ext),
                ));
            }
        }
        if self.fetch.user_agents.is_empty() {
            return Err(Error::config(
                "fetch.user_agents",
                "identity pool is empty",
            ));
        }
        if self.fetch.retry.max_attempts == 0 {
            return Err(Error::config(
                "fetch.retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        if self.fetch.request_delay.min > self.fetch.request_delay.max {
            return Err(Error::config(
                "fetch.request_delay",
                "min delay is greater than max delay",
            ));
        }
        Ok(())
    }
}

/// Target site configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root (default: "https://www.mibei77.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Host (with port, if any) that serves subscription files
    /// (default: "mm.mibei77.com")
    #[serde(default = "default_resource_host")]
    pub resource_host: String,

    /// Domains a subscription link may point at; subdomains match too
    /// (default: ["mibei77.com"])
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// File extension of subscription files (default: ".txt")
    #[serde(default = "default_resource_extension")]
    pub resource_extension: String,

    /// File extension of article pages (default: ".html")
    #[serde(default = "default_document_extension")]
    pub document_extension: String,

    /// CSS selectors for headline links, tried in order
    #[serde(default = "default_headline_selectors")]
    pub headline_selectors: Vec<String>,

    /// Captions that precede a subscription URL in article text,
    /// most specific first
    #[serde(default = "default_link_labels")]
    pub link_labels: Vec<String>,

    /// Subscription content recognition
    #[serde(default)]
    pub content: ContentConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            resource_host: default_resource_host(),
            allowed_domains: default_allowed_domains(),
            resource_extension: default_resource_extension(),
            document_extension: default_document_extension(),
            headline_selectors: default_headline_selectors(),
            link_labels: default_link_labels(),
            content: ContentConfig::default(),
        }
    }
}

/// Recognition rules for downloaded subscription content
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Prefixes that mark a strict match when the body starts with them
    #[serde(default = "default_strict_prefixes")]
    pub strict_prefixes: Vec<String>,

    /// Tokens that mark a heuristic match anywhere in the body
    /// (compared case-insensitively)
    #[serde(default = "default_protocol_tokens")]
    pub protocol_tokens: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            strict_prefixes: default_strict_prefixes(),
            protocol_tokens: default_protocol_tokens(),
        }
    }
}

/// HTTP fetch configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (default: 15 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Random pause before every attempt (default: 1-3 seconds)
    #[serde(default)]
    pub request_delay: DelayRange,

    /// User-Agent pool; one is picked at random for every attempt
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Send fetch-metadata and cache-control headers (default: true)
    #[serde(default = "default_true")]
    pub enhanced_headers: bool,

    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            request_delay: DelayRange::default(),
            user_agents: default_user_agents(),
            enhanced_headers: true,
            retry: RetryConfig::default(),
        }
    }
}

/// Inclusive range a random delay is drawn from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Lower bound (default: 1 second)
    #[serde(default = "default_delay_min", with = "duration_serde")]
    pub min: Duration,

    /// Upper bound (default: 3 seconds)
    #[serde(default = "default_delay_max", with = "duration_serde")]
    pub max: Duration,
}

impl DelayRange {
    /// A range that never sleeps
    pub const ZERO: DelayRange = DelayRange {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: default_delay_min(),
            max: default_delay_max(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait after a failed attempt (default: 5 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub retry_delay: Duration,

    /// Wait after an HTTP 403, longer than `retry_delay` (default: 10 seconds)
    #[serde(default = "default_blocked_delay", with = "duration_serde")]
    pub blocked_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
            blocked_delay: default_blocked_delay(),
        }
    }
}

/// Output file locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Subscription content (default: "subscription.txt")
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Run status record (default: "crawler_status.json")
    #[serde(default = "default_status_path")]
    pub status_path: PathBuf,
}

impl OutputConfig {
    /// Both files under `dir`, keeping their default names
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            artifact_path: dir.join(default_artifact_path()),
            status_path: dir.join(default_status_path()),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            status_path: default_status_path(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://www.mibei77.com".to_string()
}

fn default_resource_host() -> String {
    "mm.mibei77.com".to_string()
}

fn default_allowed_domains() -> Vec<String> {
    vec!["mibei77.com".to_string()]
}

fn default_resource_extension() -> String {
    ".txt".to_string()
}

fn default_document_extension() -> String {
    ".html".to_string()
}

fn default_headline_selectors() -> Vec<String> {
    [
        ".post-title a",
        ".entry-title a",
        ".title a",
        "h2 a",
        "h3 a",
        "article h2 a",
        "article h3 a",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_link_labels() -> Vec<String> {
    ["免费节点订阅链接", "v2ray订阅链接", "订阅链接"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_strict_prefixes() -> Vec<String> {
    ["vmess://", "vless://", "ss://", "ssr://", "trojan://"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_protocol_tokens() -> Vec<String> {
    ["vmess", "vless://", "ss://", "trojan://"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_delay_min() -> Duration {
    Duration::from_secs(1)
}

fn default_delay_max() -> Duration {
    Duration::from_secs(3)
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_blocked_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("subscription.txt")
}

fn default_status_path() -> PathBuf {
    PathBuf::from("crawler_status.json")
}

/// Durations travel as integer milliseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: Config = serde_json::from_str("{}").expect("parse failed");

        assert_eq!(config.site.base_url, "https://www.mibei77.com");
        assert_eq!(config.site.resource_extension, ".txt");
        assert_eq!(config.fetch.retry.max_attempts, 3);
        assert_eq!(config.fetch.timeout, Duration::from_secs(15));
        assert_eq!(config.fetch.user_agents.len(), 4);
        assert!(config.fetch.enhanced_headers);
        assert_eq!(
            config.output.artifact_path,
            PathBuf::from("subscription.txt")
        );
        config.validate().expect("defaults must validate");
    }

    #[test]
    fn test_durations_serialize_as_millis() {
        let config = RetryConfig {
            retry_delay: Duration::from_millis(1500),
            blocked_delay: Duration::from_secs(10),
            ..RetryConfig::default()
        };

        let json = serde_json::to_value(&config).expect("serialize failed");

        assert_eq!(json["retry_delay"], 1500);
        assert_eq!(json["blocked_delay"], 10_000);
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let config = RetryConfig {
            retry_delay: Duration::MAX,
            ..RetryConfig::default()
        };
        let json = serde_json::to_value(&config).expect("serialize failed");
        assert_eq!(json["retry_delay"], u64::MAX);
    }

    #[test]
    fn test_blocked_delay_outlasts_retry_delay() {
        let retry = RetryConfig::default();
        assert!(retry.blocked_delay > retry.retry_delay);

        let parsed: RetryConfig = serde_json::from_str("{}").expect("parse failed");
        assert_eq!(parsed.blocked_delay, Duration::from_secs(10));
        assert_eq!(parsed.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_nested_document() {
        let raw = r#"{
            "site": { "base_url": "http://127.0.0.1:8080" },
            "fetch": { "retry": { "max_attempts": 5 }, "request_delay": { "min": 0, "max": 10 } }
        }"#;
        let config: Config = serde_json::from_str(raw).expect("parse failed");

        assert_eq!(config.site.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.site.resource_host, "mm.mibei77.com");
        assert_eq!(config.fetch.retry.max_attempts, 5);
        assert_eq!(config.fetch.retry.retry_delay, Duration::from_secs(5));
        assert_eq!(config.fetch.retry.blocked_delay, Duration::from_secs(10));
        assert_eq!(config.fetch.request_delay.max, Duration::from_millis(10));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.site.base_url = "ftp://example.com".into();
        assert!(matches!(
            config.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "site.base_url"
        ));

        let mut config = Config::default();
        config.fetch.user_agents.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fetch.request_delay = DelayRange {
            min: Duration::from_secs(3),
            max: Duration::from_secs(1),
        };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.site.resource_extension = "txt".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crawler.json");
        std::fs::write(&path, r#"{ "output": { "artifact_path": "out/sub.txt" } }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.output.artifact_path, PathBuf::from("out/sub.txt"));
        assert_eq!(
            config.output.status_path,
            PathBuf::from("crawler_status.json")
        );
    }

    #[test]
    fn test_output_in_dir() {
        let output = OutputConfig::in_dir(Path::new("/var/lib/crawler"));
        assert_eq!(
            output.artifact_path,
            PathBuf::from("/var/lib/crawler/subscription.txt")
        );
        assert_eq!(
            output.status_path,
            PathBuf::from("/var/lib/crawler/crawler_status.json")
        );
    }
}
