//! Resource link extractor: pulls the subscription URL out of an article

pub mod patterns;


pub use patterns::{LinkMatch, LinkPatterns, LinkSource};

use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::types::{PipelineStage, ResourceLink};
use tracing::{info, warn};
use url::Url;

const STAGE: PipelineStage = PipelineStage::ExtractLink;

/// Extracts the subscription link from an article through a [`Fetcher`]
pub struct ResourceLinkExtractor<'a> {
    fetcher: &'a Fetcher,
    patterns: &'a LinkPatterns,
}

impl<'a> ResourceLinkExtractor<'a> {
    /// Create an extractor using `fetcher` for all requests
    pub fn new(fetcher: &'a Fetcher, patterns: &'a LinkPatterns) -> Self {
        Self { fetcher, patterns }
    }

    /// Fetch the article and return the first valid subscription link in it
    ///
    /// # Errors
    /// Returns `Error::NotFound` when the article cannot be fetched or no
    /// source/pattern combination yields an allowed link.
    pub async fn extract_resource_link(&self, article_url: &Url) -> Result<ResourceLink> {
        info!(url = %article_url, "Fetching article");

        let page = self.fetcher.get(article_url.as_str()).await.map_err(|e| {
            warn!(error = %e, "Could not fetch article");
            Error::not_found(STAGE, format!("article unreachable: {}", e))
        })?;

        match self.patterns.find(&page.body, &page.final_url) {
            Some(found) => {
                info!(
                    url = %found.link,
                    source = found.source.as_str(),
                    pattern = %found.pattern,
                    "Found subscription link"
                );
                Ok(found.link)
            }
            None => Err(Error::not_found(
                STAGE,
                format!("no subscription link in {}", article_url),
            )),
        }
    }
}
