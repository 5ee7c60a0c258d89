//! Candidate discovery and ranking for article URLs
//!
//! All functions here are synchronous and work on raw HTML strings, because
//! `scraper::Html` is `!Send` and must not live across an `.await`.

use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::types::{ArticleHeuristic, ArticleReference, CandidateUrl, DateKey};
use crate::utils::{normalize_url, same_site};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Heuristics run over the site root, highest priority first
///
/// New heuristics are appended here; existing ones never depend on each other.
pub const CASCADE: [ArticleHeuristic; 3] = [
    ArticleHeuristic::DateStamped,
    ArticleHeuristic::Headline,
    ArticleHeuristic::PathSegment,
];

/// Compiled article-discovery rules for one site
#[derive(Debug, Clone)]
pub struct ArticleHeuristics {
    base_url: Url,
    document_extension: String,
    date_stamped: Regex,
    path_segments: Vec<Regex>,
    headline_selectors: Vec<Selector>,
    anchor_selector: Selector,
    date_pattern: Regex,
}

impl ArticleHeuristics {
    /// Compile the rules for `site`
    pub fn from_site(site: &SiteConfig) -> Result<Self> {
        let base_url = Url::parse(&site.base_url)
            .map_err(|e| Error::config("site.base_url", format!("invalid URL: {}", e)))?;
        let ext = regex::escape(&site.document_extension);

        let date_stamped = compile(&format!(r"/\d{{4}}/\d{{2}}/\d{{8}}.*{}", ext))?;
        let path_segments = vec![
            compile(&format!(r"^.*/\d{{4}}/\d{{2}}/.*{}", ext))?,
            compile(r"^.*/article/.*")?,
            compile(r"^.*/post/.*")?,
        ];

        let headline_selectors = site
            .headline_selectors
            .iter()
            .map(|s| {
                Selector::parse(s).map_err(|e| {
                    Error::config(
                        "site.headline_selectors",
                        format!("invalid selector '{}': {}", s, e),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base_url,
            document_extension: site.document_extension.to_ascii_lowercase(),
            date_stamped,
            path_segments,
            headline_selectors,
            anchor_selector: parse_selector("a[href]")?,
            date_pattern: compile(r"/(\d{4})/(\d{2})/(\d{8})")?,
        })
    }

    /// Site root the rules resolve against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Run the whole cascade over `html`
    ///
    /// Candidates are absolute, normalised, on the same site as the base URL
    /// and unique. Order is discovery order: cascade priority first, then
    /// document order. A URL found by several heuristics keeps the tag of the
    /// first one.
    pub fn collect_candidates(&self, html: &str) -> Vec<CandidateUrl> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for heuristic in CASCADE {
            let found = self.hrefs_for(heuristic, &document);
            let before = candidates.len();
            for href in found {
                let Some(url) = normalize_url(&self.base_url, &href) else {
                    continue;
                };
                if !same_site(&url, &self.base_url) {
                    continue;
                }
                if seen.insert(url.clone()) {
                    candidates.push(CandidateUrl { url, heuristic });
                }
            }
            tracing::debug!(
                heuristic = heuristic.as_str(),
                new_candidates = candidates.len() - before,
                "Article heuristic finished"
            );
        }

        candidates
    }

    fn hrefs_for(&self, heuristic: ArticleHeuristic, document: &Html) -> Vec<String> {
        match heuristic {
            ArticleHeuristic::DateStamped => self
                .anchor_hrefs(document)
                .filter(|href| self.date_stamped.is_match(href))
                .collect(),
            ArticleHeuristic::Headline => self
                .headline_selectors
                .iter()
                .flat_map(|selector| document.select(selector))
                .filter_map(|el| el.value().attr("href"))
                .map(str::to_string)
                .collect(),
            ArticleHeuristic::PathSegment => self
                .anchor_hrefs(document)
                .filter(|href| self.path_segments.iter().any(|re| re.is_match(href)))
                .collect(),
            // Provenance tag for the listing fallback only; never in CASCADE
            ArticleHeuristic::MonthlyListing => Vec::new(),
        }
    }

    fn anchor_hrefs<'d>(&'d self, document: &'d Html) -> impl Iterator<Item = String> + 'd {
        document
            .select(&self.anchor_selector)
            .filter_map(|el| el.value().attr("href"))
            .map(str::to_string)
    }

    /// Sort key for a URL: the `YYYYMMDD` stamp after `/YYYY/MM/`, else the
    /// sentinel
    pub fn date_key(&self, url: &Url) -> DateKey {
        match self.date_pattern.captures(url.path()) {
            Some(caps) => DateKey::from_digits(caps[3].to_string()),
            None => DateKey::oldest(),
        }
    }

    /// Pick the candidate with the greatest date key
    ///
    /// Ties keep the earliest candidate, i.e. the one surfaced by the
    /// highest-priority heuristic.
    pub fn select_latest(&self, candidates: &[CandidateUrl]) -> Option<ArticleReference> {
        let mut best: Option<ArticleReference> = None;
        for candidate in candidates {
            let key = self.date_key(&candidate.url);
            let newer = best.as_ref().is_none_or(|b| key > b.date_key);
            if newer {
                best = Some(ArticleReference {
                    url: candidate.url.clone(),
                    date_key: key,
                    heuristic: candidate.heuristic,
                });
            }
        }
        best
    }

    /// Listing page for the month containing `today`, e.g. `/2024/05/`
    pub fn listing_url(&self, today: NaiveDate) -> Result<Url> {
        let path = month_prefix(today);
        self.base_url.join(&path).map_err(|e| Error::InvalidUrl {
            url: path,
            reason: e.to_string(),
        })
    }

    /// First document under the month's directory on a listing page
    pub fn first_listing_article(&self, html: &str, today: NaiveDate) -> Option<ArticleReference> {
        let prefix = month_prefix(today);
        let document = Html::parse_document(html);

        self.anchor_hrefs(&document)
            .filter_map(|href| normalize_url(&self.base_url, &href))
            .find(|url| {
                same_site(url, &self.base_url)
                    && url.path().starts_with(&prefix)
                    && url
                        .path()
                        .to_ascii_lowercase()
                        .ends_with(&self.document_extension)
            })
            .map(|url| ArticleReference {
                date_key: self.date_key(&url),
                url,
                heuristic: ArticleHeuristic::MonthlyListing,
            })
    }
}

fn month_prefix(today: NaiveDate) -> String {
    format!("/{:04}/{:02}/", today.year(), today.month())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config {
        message: format!("invalid pattern '{}': {}", pattern, e),
        key: None,
    })
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Config {
        message: format!("invalid selector '{}': {}", selector, e),
        key: None,
    })
}
