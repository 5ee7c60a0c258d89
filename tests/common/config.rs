//! Config builders pointing a pipeline at a mock site

use node_crawler::config::{DelayRange, FetchConfig, OutputConfig, RetryConfig, SiteConfig};
use node_crawler::{Config, Pipeline};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Fetch settings with no pacing and near-instant retries
pub fn fast_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout: Duration::from_secs(5),
        request_delay: DelayRange::ZERO,
        retry: RetryConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(10),
            blocked_delay: Duration::from_millis(10),
        },
        ..FetchConfig::default()
    }
}

/// Config for a mock site served by `server`, writing into `output_dir`
///
/// The mock server plays both the blog and the resource host, so the strict
/// link pattern expects `127.0.0.1:<port>` and the allowlist holds `127.0.0.1`.
pub fn mock_site_config(server: &MockServer, output_dir: &TempDir) -> Config {
    Config {
        site: SiteConfig {
            base_url: server.uri(),
            resource_host: resource_host(server),
            allowed_domains: vec!["127.0.0.1".to_string()],
            ..SiteConfig::default()
        },
        fetch: fast_fetch_config(),
        output: OutputConfig::in_dir(output_dir.path()),
    }
}

/// `host:port` of the mock server
pub fn resource_host(server: &MockServer) -> String {
    server.address().to_string()
}

/// Pipeline for the mock site, plus the temp dir it writes to
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn create_test_pipeline(server: &MockServer) -> (Pipeline, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = mock_site_config(server, &temp_dir);
    let pipeline = Pipeline::new(config).expect("Failed to build pipeline");
    (pipeline, temp_dir)
}
