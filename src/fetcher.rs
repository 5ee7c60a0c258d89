//! Resilient HTTP fetching
//!
//! A [`Fetcher`] owns one HTTP client (with a per-run cookie jar) and the
//! identity currently presented to the site. Every attempt picks a fresh
//! identity from the configured pool, sleeps a random pacing delay, and then
//! issues the request with a fixed timeout. Failures go through
//! [`fetch_with_retry`], which waits longer after a 403.
//!
//! One `Fetcher` belongs to one pipeline run. Runs that should not share an
//! identity or cookies need their own instance.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::retry::{fetch_with_retry, random_delay};
use crate::utils::parse_http_url;
use rand::seq::SliceRandom;
use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use std::sync::Mutex;
use tracing::debug;
use url::Url;

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// Optional parts of a request beyond method and URL
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Request body
    pub body: Option<String>,
    /// Extra headers, applied after the identity headers
    pub headers: Vec<(String, String)>,
}

/// A successful (2xx) response with its body read
#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// Requested URL
    pub url: Url,
    /// URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

/// HTTP client with retry, pacing and identity rotation
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
    /// User-Agent applied to the most recent attempt
    identity: Mutex<Option<String>>,
}

impl Fetcher {
    /// Create a fetcher
    ///
    /// # Errors
    /// Returns error if the identity pool is empty or the HTTP client cannot be built
    pub fn new(config: FetchConfig) -> Result<Self> {
        if config.user_agents.is_empty() {
            return Err(Error::config("fetch.user_agents", "identity pool is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self {
            client,
            config,
            identity: Mutex::new(None),
        })
    }

    /// Fetch configuration in use
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Identity (User-Agent) presented on the most recent attempt
    pub fn current_identity(&self) -> Option<String> {
        self.identity.lock().ok().and_then(|guard| guard.clone())
    }

    /// GET a URL with retries
    pub async fn get(&self, url: &str) -> Result<FetchedPage> {
        self.fetch(url, Method::GET, &RequestOptions::default())
            .await
    }

    /// Issue one logical request with retries
    ///
    /// Returns a 2xx response with a readable body, or the error from the
    /// final attempt. An invalid URL fails immediately without a request.
    pub async fn fetch(
        &self,
        url: &str,
        method: Method,
        options: &RequestOptions,
    ) -> Result<FetchedPage> {
        let target = parse_http_url(url)?;
        let extra_headers = build_extra_headers(&options.headers)?;

        fetch_with_retry(&self.config.retry, |attempt| {
            let target = target.clone();
            let method = method.clone();
            let extra_headers = extra_headers.clone();
            async move {
                self.attempt(target, method, extra_headers, options.body.clone(), attempt)
                    .await
            }
        })
        .await
    }

    async fn attempt(
        &self,
        url: Url,
        method: Method,
        extra_headers: HeaderMap,
        body: Option<String>,
        attempt: u32,
    ) -> Result<FetchedPage> {
        let mut headers = self.rotate_identity()?;
        headers.extend(extra_headers);

        let pause = random_delay(&self.config.request_delay);
        debug!(url = %url, attempt, delay_ms = pause.as_millis(), "Pacing before request");
        tokio::time::sleep(pause).await;

        let mut request = self
            .client
            .request(method, url.clone())
            .headers(headers)
            .timeout(self.config.timeout);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Blocked {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await?;

        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "Fetched");

        Ok(FetchedPage {
            url,
            final_url,
            status: status.as_u16(),
            body,
        })
    }

    /// Pick a random identity, remember it, and build the header set for it
    fn rotate_identity(&self) -> Result<HeaderMap> {
        let user_agent = self
            .config
            .user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| Error::config("fetch.user_agents", "identity pool is empty"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&user_agent).map_err(|e| {
                Error::config("fetch.user_agents", format!("invalid User-Agent: {}", e))
            })?,
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );
        if self.config.enhanced_headers {
            headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
            headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
            headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        }

        if let Ok(mut current) = self.identity.lock() {
            *current = Some(user_agent);
        }
        Ok(headers)
    }
}

fn build_extra_headers(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Config {
            message: format!("invalid header name '{}': {}", name, e),
            key: None,
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::Config {
            message: format!("invalid value for header '{}': {}", name, e),
            key: None,
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
