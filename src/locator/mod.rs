//! Article locator: finds the most recent article on the site
//!
//! The site root is scanned with an ordered cascade of independent
//! heuristics (see [`heuristics::CASCADE`]). Every candidate is normalised and
//! deduplicated, then ranked by the date stamp in its path. Only when the
//! cascade finds nothing at all does the locator fall back to the current
//! month's listing page.

pub mod heuristics;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use heuristics::{ArticleHeuristics, CASCADE};

use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::types::{ArticleReference, PipelineStage};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

const STAGE: PipelineStage = PipelineStage::LocateArticle;

/// Locates the newest article through a [`Fetcher`]
pub struct ArticleLocator<'a> {
    fetcher: &'a Fetcher,
    rules: &'a ArticleHeuristics,
}

impl<'a> ArticleLocator<'a> {
    /// Create a locator using `fetcher` for all requests
    pub fn new(fetcher: &'a Fetcher, rules: &'a ArticleHeuristics) -> Self {
        Self { fetcher, rules }
    }

    /// Find the newest article, using today's local date for the fallback
    pub async fn locate_latest_article(&self) -> Result<ArticleReference> {
        self.locate_latest_article_on(Local::now().date_naive())
            .await
    }

    /// Find the newest article, using `today` to build the fallback listing URL
    ///
    /// # Errors
    /// Returns `Error::NotFound` when the site root is unreachable or every
    /// heuristic, fallback included, comes up empty.
    pub async fn locate_latest_article_on(&self, today: NaiveDate) -> Result<ArticleReference> {
        let root = self.rules.base_url().as_str();
        info!(url = root, "Fetching site root");

        let page = self.fetcher.get(root).await.map_err(|e| {
            warn!(error = %e, "Could not fetch site root");
            Error::not_found(STAGE, format!("site root unreachable: {}", e))
        })?;

        let candidates = self.rules.collect_candidates(&page.body);
        info!(candidates = candidates.len(), "Collected article candidates");

        if let Some(article) = self.rules.select_latest(&candidates) {
            info!(
                url = %article.url,
                date_key = %article.date_key,
                heuristic = article.heuristic.as_str(),
                "Selected latest article"
            );
            return Ok(article);
        }

        self.locate_from_listing(today).await
    }

    async fn locate_from_listing(&self, today: NaiveDate) -> Result<ArticleReference> {
        let listing = self.rules.listing_url(today)?;
        info!(url = %listing, "No candidates on site root, trying monthly listing");

        let page = self.fetcher.get(listing.as_str()).await.map_err(|e| {
            warn!(error = %e, "Could not fetch monthly listing");
            Error::not_found(STAGE, format!("no candidates on site root; listing failed: {}", e))
        })?;

        match self.rules.first_listing_article(&page.body, today) {
            Some(article) => {
                info!(url = %article.url, "Selected article from monthly listing");
                Ok(article)
            }
            None => Err(Error::not_found(
                STAGE,
                format!("no candidates on site root or {}", listing),
            )),
        }
    }
}
