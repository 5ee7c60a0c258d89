//! # node-crawler
//!
//! Finds the newest article on a free-node blog, pulls the subscription link
//! out of it, downloads the subscription and records the outcome.
//!
//! ## Pipeline
//!
//! 1. [`locator`] scans the site root with independent heuristics and picks
//!    the article with the newest date stamp, falling back to the monthly
//!    listing page when the root yields nothing.
//! 2. [`extractor`] scans the article's text, anchors and code blocks with a
//!    pattern cascade and returns the first allowed subscription link.
//! 3. [`retriever`] downloads the subscription, rejects empty content and
//!    classifies its format.
//! 4. [`recorder`] writes the artifact (only after validation) and the status
//!    record (always).
//!
//! All HTTP goes through one [`Fetcher`] per run, which rotates identities,
//! paces requests and retries transient failures.
//!
//! ## Quick Start
//!
//! ```no_run
//! use node_crawler::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(Config::default())?;
//!     let report = pipeline.run().await;
//!
//!     if let Some(url) = &report.status.resource_url {
//!         println!("subscription: {}", url);
//!     }
//!     std::process::exit(if report.success() { 0 } else { 1 });
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Resource link extraction
pub mod extractor;
/// Resilient HTTP fetching
pub mod fetcher;
/// Latest-article discovery
pub mod locator;
/// Stage driver
pub mod pipeline;
/// Artifact and status persistence
pub mod recorder;
/// Retry logic with blocked/transient classification
pub mod retry;
/// Subscription download and validation
pub mod retriever;
/// Core data model
pub mod types;
/// URL helpers
pub mod utils;

pub use config::{Config, ContentConfig, DelayRange, FetchConfig, OutputConfig, RetryConfig, SiteConfig};
pub use error::{Error, Result};
pub use extractor::{LinkPatterns, ResourceLinkExtractor};
pub use fetcher::{FetchedPage, Fetcher, RequestOptions};
pub use locator::{ArticleHeuristics, ArticleLocator};
pub use pipeline::{Pipeline, RunReport, run_once};
pub use recorder::RunRecorder;
pub use retriever::ResourceRetriever;
pub use types::{
    ArticleHeuristic, ArticleReference, CandidateUrl, ContentFormat, DateKey, PipelineStage,
    ResourceContent, ResourceLink, RunStatus,
};
