//! Source × pattern cascade for subscription links
//!
//! Sources are scanned in priority order (page text, anchor hrefs, code
//! blocks). Within a source, patterns run from most to least specific, and
//! matches of one pattern are tried in document order. The first match that
//! survives punctuation trimming and the host/extension check wins.

use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::types::ResourceLink;
use crate::utils::{host_allowed, parse_http_url, trim_punctuation};
use regex::Regex;
use scraper::{Html, Node, Selector};
use url::Url;

/// Where in the article a link is looked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkSource {
    /// Rendered text of the page
    PageText,
    /// `href` attributes of anchors, resolved against the article URL
    AnchorHref,
    /// Text inside `<pre>` and `<code>` elements
    CodeBlock,
}

impl LinkSource {
    /// Short stable name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkSource::PageText => "page_text",
            LinkSource::AnchorHref => "anchor_href",
            LinkSource::CodeBlock => "code_block",
        }
    }
}

/// Elements that start a new line in rendered text; everything else is inline
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Sources in priority order
pub const SOURCES: [LinkSource; 3] = [
    LinkSource::PageText,
    LinkSource::AnchorHref,
    LinkSource::CodeBlock,
];

/// One rule of the cascade: a regex and the capture group holding the URL
#[derive(Debug, Clone)]
pub struct LinkPattern {
    name: String,
    regex: Regex,
    group: usize,
}

impl LinkPattern {
    fn new(name: impl Into<String>, pattern: &str, group: usize) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::Config {
            message: format!("invalid link pattern '{}': {}", pattern, e),
            key: None,
        })?;
        Ok(Self {
            name: name.into(),
            regex,
            group,
        })
    }

    /// Rule name for logs
    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.regex
            .captures_iter(text)
            .filter_map(move |caps| caps.get(self.group).map(|m| m.as_str()))
    }
}

/// A link found by the cascade, with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    /// Validated link
    pub link: ResourceLink,
    /// Source it was found in
    pub source: LinkSource,
    /// Name of the pattern that matched
    pub pattern: String,
}

/// Compiled link cascade for one site
#[derive(Debug, Clone)]
pub struct LinkPatterns {
    patterns: Vec<LinkPattern>,
    allowed_domains: Vec<String>,
    extension: String,
    anchor_selector: Selector,
    code_selector: Selector,
}

impl LinkPatterns {
    /// Build the cascade for `site`, most specific pattern first
    pub fn from_site(site: &SiteConfig) -> Result<Self> {
        let ext = regex::escape(&site.resource_extension);
        let mut patterns = Vec::new();

        patterns.push(LinkPattern::new(
            "resource_host",
            &format!(
                r#"(?i)https?://{}/\d{{6}}/[^"'\s]+{}"#,
                regex::escape(&site.resource_host),
                ext
            ),
            0,
        )?);

        for label in &site.link_labels {
            patterns.push(LinkPattern::new(
                format!("label:{}", label),
                &format!(r#"(?i){}[^"]*?(https?://\S+)"#, regex::escape(label)),
                1,
            )?);
        }

        for domain in &site.allowed_domains {
            patterns.push(LinkPattern::new(
                format!("domain:{}", domain),
                &format!(
                    r#"(?i)https?://[^"'\s]*?{}[^"'\s]*?{}"#,
                    regex::escape(domain),
                    ext
                ),
                0,
            )?);
        }

        patterns.push(LinkPattern::new(
            "any_extension",
            &format!(r#"(?i)https?://[^"'\s]*?{}"#, ext),
            0,
        )?);

        Ok(Self {
            patterns,
            allowed_domains: site.allowed_domains.clone(),
            extension: site.resource_extension.to_ascii_lowercase(),
            anchor_selector: selector("a[href]")?,
            code_selector: selector("pre, code")?,
        })
    }

    /// Pattern names in cascade order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.name())
    }

    /// Run the full cascade over an article page
    pub fn find(&self, html: &str, article_url: &Url) -> Option<LinkMatch> {
        let document = Html::parse_document(html);

        for source in SOURCES {
            let texts = self.source_texts(&document, source, article_url);
            if let Some((pattern, link)) = self.find_in_texts(&texts) {
                return Some(LinkMatch {
                    link,
                    source,
                    pattern: pattern.to_string(),
                });
            }
        }
        None
    }

    fn find_in_texts(&self, texts: &[String]) -> Option<(&str, ResourceLink)> {
        for pattern in &self.patterns {
            for text in texts {
                for raw in pattern.matches(text) {
                    if let Some(link) = self.validate(raw) {
                        return Some((pattern.name(), link));
                    }
                }
            }
        }
        None
    }

    fn source_texts(&self, document: &Html, source: LinkSource, article_url: &Url) -> Vec<String> {
        match source {
            LinkSource::PageText => vec![rendered_text(document)],
            LinkSource::AnchorHref => document
                .select(&self.anchor_selector)
                .filter_map(|el| el.value().attr("href"))
                .filter_map(|href| article_url.join(href.trim()).ok())
                .map(String::from)
                .collect(),
            LinkSource::CodeBlock => document
                .select(&self.code_selector)
                .map(|el| el.text().collect::<String>())
                .collect(),
        }
    }

    /// Trim a raw match and accept it only on an allowed host with the
    /// resource extension
    pub fn validate(&self, raw: &str) -> Option<ResourceLink> {
        let url = parse_http_url(trim_punctuation(raw)).ok()?;
        if !host_allowed(&url, &self.allowed_domains) {
            return None;
        }
        if !url.path().to_ascii_lowercase().ends_with(&self.extension) {
            return None;
        }
        Some(ResourceLink::new(url))
    }
}

/// Page text as a browser would lay it out: inline markup joins seamlessly,
/// block elements start a new line
fn rendered_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.root_element().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => text.push('\n'),
            _ => {}
        }
    }
    text
}

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| Error::Config {
        message: format!("invalid selector '{}': {}", raw, e),
        key: None,
    })
}
