//! Resource retriever: downloads the subscription and checks its shape
//!
//! An empty body is the only hard failure. Format classification is a
//! diagnostic and never rejects content.

use crate::config::ContentConfig;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::types::{ContentFormat, PipelineStage, ResourceContent, ResourceLink};
use tracing::{info, warn};

const BOM: char = '\u{feff}';

/// Downloads subscription content through a [`Fetcher`]
pub struct ResourceRetriever<'a> {
    fetcher: &'a Fetcher,
    content: &'a ContentConfig,
}

impl<'a> ResourceRetriever<'a> {
    /// Create a retriever using `fetcher` for the download
    pub fn new(fetcher: &'a Fetcher, content: &'a ContentConfig) -> Self {
        Self { fetcher, content }
    }

    /// Fetch the subscription and validate it
    ///
    /// # Errors
    /// Returns `Error::NotFound` when the download fails and
    /// `Error::Validation` when the body is empty or whitespace only.
    pub async fn retrieve(&self, link: &ResourceLink) -> Result<ResourceContent> {
        info!(url = %link, "Fetching subscription content");

        let page = self.fetcher.get(link.as_str()).await.map_err(|e| {
            warn!(error = %e, "Could not fetch subscription content");
            Error::not_found(PipelineStage::Retrieve, format!("download failed: {}", e))
        })?;

        let content = validate_content(page.body, self.content)?;
        match content.format() {
            ContentFormat::Strict => {
                info!(chars = content.char_len(), format = "strict", "Subscription content looks valid")
            }
            ContentFormat::Heuristic => info!(
                chars = content.char_len(),
                format = "heuristic",
                "Subscription content contains node descriptors"
            ),
            ContentFormat::Unrecognized => warn!(
                chars = content.char_len(),
                format = "unrecognized",
                "Subscription content format not recognised, keeping it anyway"
            ),
        }
        Ok(content)
    }
}

/// Reject an empty body, otherwise wrap it with its format classification
pub fn validate_content(body: String, rules: &ContentConfig) -> Result<ResourceContent> {
    if body.trim().is_empty() {
        return Err(Error::Validation("subscription content is empty".to_string()));
    }
    let format = classify(&body, rules);
    Ok(ResourceContent::new(body, format))
}

/// Classify a body against the known node-protocol prefixes and tokens
pub fn classify(body: &str, rules: &ContentConfig) -> ContentFormat {
    let head = body.trim_start_matches(BOM).trim_start();
    if rules
        .strict_prefixes
        .iter()
        .any(|prefix| head.starts_with(prefix.as_str()))
    {
        return ContentFormat::Strict;
    }

    let lowered = body.to_lowercase();
    if rules
        .protocol_tokens
        .iter()
        .any(|token| lowered.contains(&token.to_lowercase()))
    {
        return ContentFormat::Heuristic;
    }

    ContentFormat::Unrecognized
}
