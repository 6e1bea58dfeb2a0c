//! Link extraction and citation classification.

use std::sync::LazyLock;

use avm_core::CitationCategory;
use regex::Regex;

use crate::patterns::{is_significant, normalize_name};

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\((https?://[^\s)]+)\)").expect("valid markdown link regex")
});

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>\[\]()"'`]+"#).expect("valid url regex"));

/// Hosts treated as social media. Subdomains match too.
const SOCIAL_HOSTS: &[&str] = &[
    "facebook.com",
    "fb.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "t.co",
    "linkedin.com",
    "youtube.com",
    "youtu.be",
    "tiktok.com",
    "reddit.com",
    "pinterest.com",
    "threads.net",
    "quora.com",
    "snapchat.com",
    "tumblr.com",
];

/// A link found in response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub url: String,
    /// Lowercase host without `www.` or port.
    pub host: String,
    /// Anchor text for markdown links.
    pub anchor: Option<String>,
}

/// Markdown links and bare URLs in text order; a URL inside a markdown link
/// is reported once.
#[must_use]
pub fn extract_links(text: &str) -> Vec<LinkRef> {
    let mut links: Vec<(usize, LinkRef)> = Vec::new();
    let mut covered: Vec<std::ops::Range<usize>> = Vec::new();

    for caps in MARKDOWN_LINK.captures_iter(text) {
        let (Some(whole), Some(anchor), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        covered.push(whole.range());
        let url = trim_url(url.as_str());
        if let Some(host) = host_of(url) {
            links.push((
                whole.start(),
                LinkRef {
                    url: url.to_string(),
                    host,
                    anchor: Some(anchor.as_str().trim().to_string()).filter(|a| !a.is_empty()),
                },
            ));
        }
    }

    for m in BARE_URL.find_iter(text) {
        if covered.iter().any(|r| r.contains(&m.start())) {
            continue;
        }
        let url = trim_url(m.as_str());
        if let Some(host) = host_of(url) {
            links.push((
                m.start(),
                LinkRef {
                    url: url.to_string(),
                    host,
                    anchor: None,
                },
            ));
        }
    }

    links.sort_by_key(|(start, _)| *start);
    links.into_iter().map(|(_, link)| link).collect()
}

/// Blanks out URLs so a brand name inside a link target is not counted as a
/// mention. Markdown anchor text is kept.
#[must_use]
pub fn strip_urls(text: &str) -> String {
    BARE_URL.replace_all(text, " ").into_owned()
}

fn trim_url(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?', '*', '_', '>'])
}

/// Lowercase host of an `http(s)` URL without `www.`, credentials, or port.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() || !host.contains('.') {
        return None;
    }
    Some(host)
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[must_use]
pub fn is_social_host(host: &str) -> bool {
    SOCIAL_HOSTS.iter().any(|s| host_matches(host, s))
}

fn normalize_domain(domain: &str) -> String {
    let d = domain.trim().to_lowercase();
    let d = d
        .strip_prefix("https://")
        .or_else(|| d.strip_prefix("http://"))
        .unwrap_or(&d);
    let d = d.split('/').next().unwrap_or(d);
    d.strip_prefix("www.").unwrap_or(d).to_string()
}

fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// `true` when `host` belongs to the brand: one of its registered domains, or
/// a host label equal to the brand's compact name (or its first significant
/// word) when no domains are registered.
#[must_use]
pub fn is_brand_host(host: &str, brand_name: &str, brand_domains: &[String]) -> bool {
    if !brand_domains.is_empty() {
        return brand_domains
            .iter()
            .map(|d| normalize_domain(d))
            .any(|d| !d.is_empty() && host_matches(host, &d));
    }

    let normalized = normalize_name(brand_name);
    let mut candidates = vec![compact(&normalized)];
    if let Some(first) = normalized.split_whitespace().find(|w| is_significant(w)) {
        candidates.push(compact(first));
    }

    let labels: Vec<&str> = host.split('.').collect();
    let Some((_tld, names)) = labels.split_last() else {
        return false;
    };
    names.iter().any(|label| {
        candidates
            .iter()
            .any(|c| !c.is_empty() && *label == c.as_str())
    })
}

/// Classify a link host from one brand's point of view.
#[must_use]
pub fn classify(host: &str, brand_name: &str, brand_domains: &[String]) -> CitationCategory {
    if is_brand_host(host, brand_name, brand_domains) {
        CitationCategory::Brand
    } else if is_social_host(host) {
        CitationCategory::Social
    } else {
        CitationCategory::Earned
    }
}
