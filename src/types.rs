//! Core data model for a crawl run
//!
//! Every value here is produced by one pipeline stage and handed forward by
//! value. Nothing outlives a single run.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Pipeline stage, used to attribute failures and log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Finding the newest article on the site
    LocateArticle,
    /// Finding the subscription link inside the article
    ExtractLink,
    /// Downloading and validating the subscription content
    Retrieve,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::LocateArticle => "article",
            PipelineStage::ExtractLink => "subscription link",
            PipelineStage::Retrieve => "subscription content",
        };
        f.write_str(name)
    }
}

/// Heuristic of the article locator that surfaced a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArticleHeuristic {
    /// Anchor path carries a `/YYYY/MM/YYYYMMDD...` document stamp
    DateStamped,
    /// Anchor sits inside a headline or article-title container
    Headline,
    /// Anchor path looks like a dated page, `/article/` or `/post/`
    PathSegment,
    /// First document under the current month's listing page
    MonthlyListing,
}

impl ArticleHeuristic {
    /// Short stable name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleHeuristic::DateStamped => "date_stamped",
            ArticleHeuristic::Headline => "headline",
            ArticleHeuristic::PathSegment => "path_segment",
            ArticleHeuristic::MonthlyListing => "monthly_listing",
        }
    }
}

/// A URL found while scanning a page, tagged with the heuristic that found it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateUrl {
    /// Absolute, normalised URL
    pub url: Url,
    /// Heuristic that produced it
    pub heuristic: ArticleHeuristic,
}

/// Sort key derived from the date stamp in an article path
///
/// Always eight ASCII digits, so lexicographic order is date order. Paths
/// without a date get [`DateKey::OLDEST`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(String);

impl DateKey {
    /// Sentinel key for URLs without a recognisable date; sorts last
    pub const OLDEST: &'static str = "00000000";

    /// Build a key from eight date digits
    pub(crate) fn from_digits(digits: String) -> Self {
        debug_assert_eq!(digits.len(), 8);
        Self(digits)
    }

    /// The sentinel key
    pub fn oldest() -> Self {
        Self(Self::OLDEST.to_string())
    }

    /// True when no date was found in the URL
    pub fn is_oldest(&self) -> bool {
        self.0 == Self::OLDEST
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The article chosen as the most recent one
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleReference {
    /// Article URL
    pub url: Url,
    /// Sort key derived from the URL path
    pub date_key: DateKey,
    /// Heuristic that first surfaced this URL
    pub heuristic: ArticleHeuristic,
}

/// A subscription URL extracted from an article
///
/// Only constructed after the host allowlist and extension checks pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceLink {
    url: Url,
}

impl ResourceLink {
    pub(crate) fn new(url: Url) -> Self {
        Self { url }
    }

    /// The validated URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL as a string slice
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for ResourceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// How well the downloaded content matches a known subscription shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    /// Content starts with a known node-protocol prefix
    Strict,
    /// A known protocol token appears somewhere in the content
    Heuristic,
    /// Nothing recognisable; kept anyway
    Unrecognized,
}

/// Downloaded subscription content, guaranteed non-empty after trimming
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceContent {
    body: String,
    format: ContentFormat,
}

impl ResourceContent {
    pub(crate) fn new(body: String, format: ContentFormat) -> Self {
        Self { body, format }
    }

    /// Raw body, exactly as served
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Format classification
    pub fn format(&self) -> ContentFormat {
        self.format
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.body.chars().count()
    }

    /// Consume and return the body
    pub fn into_body(self) -> String {
        self.body
    }
}

/// Outcome record of one run, written once by the recorder
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// When the run finished (ISO-8601)
    pub last_run: DateTime<Local>,
    /// Whether the subscription was saved
    pub success: bool,
    /// Article URL, if the locator got that far
    pub article_url: Option<String>,
    /// Subscription URL, if the extractor got that far
    #[serde(rename = "subscription_url")]
    pub resource_url: Option<String>,
}

impl RunStatus {
    /// Status stamped with the current local time
    pub fn now(
        success: bool,
        article: Option<&ArticleReference>,
        link: Option<&ResourceLink>,
    ) -> Self {
        Self {
            last_run: Local::now(),
            success,
            article_url: article.map(|a| a.url.to_string()),
            resource_url: link.map(|l| l.to_string()),
        }
    }
}

#[allow(clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_ordering() {
        let newer = DateKey::from_digits("20240530".to_string());
        let older = DateKey::from_digits("20240401".to_string());
        assert!(newer > older);
        assert!(older > DateKey::oldest());
        assert!(DateKey::oldest().is_oldest());
    }

    #[test]
    fn test_run_status_serializes_expected_keys() {
        let status = RunStatus {
            last_run: Local::now(),
            success: false,
            article_url: Some("https://www.mibei77.com/2024/05/20240530-a.html".into()),
            resource_url: None,
        };

        let json = serde_json::to_value(&status).expect("serialize failed");
        assert_eq!(json["success"], false);
        assert_eq!(
            json["article_url"],
            "https://www.mibei77.com/2024/05/20240530-a.html"
        );
        assert!(json["subscription_url"].is_null());
        assert!(json["last_run"].is_string());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::LocateArticle.to_string(), "article");
        assert_eq!(PipelineStage::ExtractLink.to_string(), "subscription link");
    }
}
