//! URL helpers shared by the locator and the extractor

use crate::error::{Error, Result};
use url::Url;

/// Punctuation that commonly sticks to a URL copied out of prose
const STRAY_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '，', '。', '；', '：', '！', '？', '、',
];

/// Parse an absolute HTTP(S) URL
pub fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::InvalidUrl {
                url: raw.to_string(),
                reason: format!("scheme '{}' is not http or https", scheme),
            });
        }
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl {
            url: raw.to_string(),
            reason: "URL has no host".to_string(),
        });
    }
    Ok(url)
}

/// Resolve `href` against `base` and normalise it for deduplication
///
/// Fragments are dropped and a trailing slash on a non-root path is removed,
/// so `/a/b.html`, `/a/b.html#top` and `/a/b.html/` all compare equal.
/// Returns `None` for anything that does not resolve to HTTP(S).
pub fn normalize_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    url.set_fragment(None);
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }
    Some(url)
}

/// True when both URLs share scheme-independent host and port
pub fn same_site(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

/// True when the URL's host is one of `domains` or a subdomain of one
pub fn host_allowed(url: &Url, domains: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    domains.iter().any(|domain| {
        let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
        !domain.is_empty()
            && (host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.')))
    })
}

/// Strip stray punctuation from both ends of a matched URL
pub fn trim_punctuation(raw: &str) -> &str {
    raw.trim().trim_matches(STRAY_PUNCTUATION)
}
