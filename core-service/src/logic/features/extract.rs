//! Page Feature Extraction
//!
//! Builds a `FeatureRecord` from a raw page snapshot (URL, hostname,
//! visible text, HTML, title), the way a browser extension does before
//! calling the analysis API.
//!
//! Redirect counts cannot be observed from a snapshot and are always 0.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::record::{FeatureRecord, PageMetadata, UrlFeatures};
use crate::logic::trust::host_from_url;

// ============================================================================
// INPUT
// ============================================================================

/// Raw page data captured by a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub dom_text: String,
    #[serde(default)]
    pub html_content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    #[error("URL has no scheme or host: {0:?}")]
    InvalidUrl(String),
}

// ============================================================================
// PATTERNS
// ============================================================================

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("page feature pattern must compile")
}

static IP_HOST: Lazy<Regex> = Lazy::new(|| pattern(r"^(\d{1,3}\.){3}\d{1,3}$"));
static PERCENT_ESCAPE: Lazy<Regex> = Lazy::new(|| pattern(r"%[0-9A-Fa-f]{2}"));
static ROBOTS_NOINDEX: Lazy<Regex> = Lazy::new(|| {
    pattern(r#"(?i)<meta\s+name=["']robots["']\s+content=["'][^"']*noindex[^"']*["']\s*/?>"#)
});
static VIEWPORT: Lazy<Regex> = Lazy::new(|| {
    pattern(r#"(?i)<meta\s+name=["']viewport["']\s+content=["'][^"']*width=device-width[^"']*["']\s*/?>"#)
});
static DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    pattern(r#"(?i)<meta\s+name=["']description["']\s+content=["'][^"']+["']\s*/?>"#)
});
static POPUP: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)popup"));
static IFRAME: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)<iframe\b"));
static EXTERNAL_FORM: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)<form[^>]+action=["']http"#));
static SUBMIT_INPUT: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)<input[^>]+type=["']submit["']"#));
static HIDDEN_INPUT: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)<input[^>]+type=["']hidden["']"#));
static PASSWORD_INPUT: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)<input[^>]+type=["']password["']"#));
static SOCIAL_LINK: Lazy<Regex> = Lazy::new(|| {
    pattern(r#"(?i)<a[^>]+href=["']https?://(www\.)?(facebook|twitter|instagram|linkedin|youtube)\.com"#)
});
static COPYRIGHT: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)©|copyright"));
static IMG_TAG: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)<img\b"));
static STYLESHEET: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)<link[^>]+rel=["']stylesheet["']"#));
static SCRIPT_TAG: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)<script\b"));
static SELF_REF: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)href=["']#["']"#));
static EMPTY_REF: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)href=["']["']"#));
static ABSOLUTE_REF: Lazy<Regex> = Lazy::new(|| pattern(r#"(?i)href=["']https?://([^"'/?#]+)"#));

/// Keywords that mark a URL as impersonating a bank/payment brand
const BRAND_KEYWORDS: &[&str] = &["amazon", "paypal", "google", "microsoft"];

/// Second-level public suffixes that do not count as a subdomain
const MULTI_LEVEL_TLDS: &[&str] = &["co.uk", "org.uk", "gov.uk", "ac.uk", "co.jp", "co.in", "com.au"];

// ============================================================================
// EXTRACTION
// ============================================================================

/// Compute a full feature record from a page snapshot
pub fn extract_features(page: &PageSnapshot) -> Result<FeatureRecord, ExtractError> {
    let url = page.url.trim();
    if !url.contains("://") {
        return Err(ExtractError::InvalidUrl(page.url.clone()));
    }
    let hostname = if page.hostname.trim().is_empty() {
        host_from_url(url).ok_or_else(|| ExtractError::InvalidUrl(page.url.clone()))?
    } else {
        page.hostname.trim().to_string()
    };

    let url_lower = url.to_lowercase();
    let url_len = url.chars().count();
    let ratio = |count: u32| if url_len > 0 { f64::from(count) / url_len as f64 } else { 0.0 };

    let letters = count_chars(url, |c| c.is_ascii_alphabetic());
    let digits = count_chars(url, |c| c.is_ascii_digit());
    let other_special = count_chars(url, |c| !c.is_ascii_alphanumeric() && !is_url_safe_symbol(c));

    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or_default();
    let obfuscated = count_chars(url, |c| c == '@') + count_matches(&PERCENT_ESCAPE, url);
    let has_obfuscation = obfuscated > 0 || after_scheme.contains("//");

    let html = page.html_content.as_str();
    let text = page.dom_text.as_str();
    let (line_count, longest_line) = line_stats(text);

    let features = UrlFeatures {
        url_length: saturate(url_len),
        domain_length: saturate(hostname.chars().count()),
        is_domain_ip: flag(IP_HOST.is_match(&hostname)),
        no_of_sub_domain: count_subdomains(&hostname),
        has_obfuscation: flag(has_obfuscation),
        no_of_obfuscated_char: obfuscated,
        obfuscation_ratio: ratio(obfuscated),
        no_of_letters_in_url: letters,
        letter_ratio_in_url: ratio(letters),
        no_of_degits_in_url: digits,
        degit_ratio_in_url: ratio(digits),
        no_of_equals_in_url: count_chars(url, |c| c == '='),
        no_of_qmark_in_url: count_chars(url, |c| c == '?'),
        no_of_ampersand_in_url: count_chars(url, |c| c == '&'),
        no_of_other_special_chars_in_url: other_special,
        spacial_char_ratio_in_url: ratio(other_special),
        is_https: flag(url_lower.starts_with("https:")),
        line_of_code: line_count,
        largest_line_length: longest_line,
        has_favicon: flag(page.favicon.as_deref().is_some_and(|f| !f.trim().is_empty())),
        robots: flag(ROBOTS_NOINDEX.is_match(html)),
        is_responsive: flag(VIEWPORT.is_match(html)),
        no_of_url_redirect: 0,
        no_of_self_redirect: 0,
        has_description: flag(DESCRIPTION.is_match(html)),
        no_of_popup: count_matches(&POPUP, text),
        no_of_iframe: count_matches(&IFRAME, html),
        has_external_form_submit: flag(EXTERNAL_FORM.is_match(html)),
        has_social_net: flag(SOCIAL_LINK.is_match(html)),
        has_submit_button: flag(SUBMIT_INPUT.is_match(html)),
        has_hidden_fields: flag(HIDDEN_INPUT.is_match(html)),
        has_password_field: flag(PASSWORD_INPUT.is_match(html)),
        bank: flag(BRAND_KEYWORDS.iter().any(|k| url_lower.contains(k))),
        pay: flag(url_lower.contains("pay")),
        crypto: flag(url_lower.contains("crypto")),
        has_copyright_info: flag(COPYRIGHT.is_match(text)),
        no_of_image: count_matches(&IMG_TAG, html),
        no_of_css: count_matches(&STYLESHEET, html),
        no_of_js: count_matches(&SCRIPT_TAG, html),
        no_of_self_ref: count_matches(&SELF_REF, html),
        no_of_empty_ref: count_matches(&EMPTY_REF, html),
        no_of_external_ref: count_external_refs(html, &hostname),
    };

    let title = page.title.trim();
    let has_title = !title.is_empty();
    let title_lower = title.to_lowercase();
    let title_mentions = |needle: &str| {
        if has_title && !needle.is_empty() && title_lower.contains(&needle.to_lowercase()) {
            1.0
        } else {
            0.0
        }
    };

    let metadata = PageMetadata {
        has_title: Some(flag(has_title)),
        title: has_title.then(|| title.to_string()),
        domain_title_match_score: Some(title_mentions(hostname.as_str())),
        url_title_match_score: Some(title_mentions(url)),
        hostname: Some(hostname.clone()),
        url: Some(url.to_string()),
    };

    Ok(FeatureRecord::new(features, metadata))
}

// ============================================================================
// HELPERS
// ============================================================================

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn count_chars(s: &str, predicate: impl Fn(char) -> bool) -> u32 {
    saturate(s.chars().filter(|&c| predicate(c)).count())
}

fn count_matches(re: &Regex, haystack: &str) -> u32 {
    saturate(re.find_iter(haystack).count())
}

/// Symbols allowed unescaped in a URL (RFC 3986 reserved + unreserved + `%`)
fn is_url_safe_symbol(c: char) -> bool {
    matches!(
        c,
        '-' | '.' | '_' | '~' | ':' | '/' | '?' | '#' | '[' | ']' | '@' | '!' | '$' | '&' | '\''
            | '(' | ')' | '*' | '+' | ',' | ';' | '=' | '%'
    )
}

fn line_stats(text: &str) -> (u32, u32) {
    if text.is_empty() {
        return (0, 0);
    }
    let mut lines = 0usize;
    let mut longest = 0usize;
    for line in text.split('\n') {
        lines += 1;
        longest = longest.max(line.chars().count());
    }
    (saturate(lines), saturate(longest))
}

/// Count subdomain labels, treating known two-level suffixes as one TLD
pub fn count_subdomains(hostname: &str) -> u32 {
    let host = hostname.trim().to_lowercase();
    if host.is_empty() {
        return 0;
    }
    let parts: Vec<&str> = host.split('.').collect();
    let last_two = if parts.len() >= 2 {
        parts[parts.len() - 2..].join(".")
    } else {
        String::new()
    };
    let registrable = if MULTI_LEVEL_TLDS.contains(&last_two.as_str()) { 3 } else { 2 };
    saturate(parts.len().saturating_sub(registrable))
}

fn count_external_refs(html: &str, hostname: &str) -> u32 {
    let own = hostname.to_lowercase();
    let external = ABSOLUTE_REF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter(|host| own.is_empty() || !host.as_str().to_lowercase().starts_with(&own))
        .count();
    saturate(external)
}
