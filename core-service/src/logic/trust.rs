//! Trusted-Domain Filter
//!
//! Short-circuits known-safe hosts before any model call.
//! Matching is label-based: a host matches an entry when it equals the entry
//! or ends with `.` + entry. A plain substring never matches
//! (`evil-linkedin.com` is not `linkedin.com`).

use serde::Serialize;

use crate::constants::DEFAULT_TRUSTED_DOMAINS;

/// Immutable set of trusted apex domains
#[derive(Debug, Clone, Serialize)]
pub struct TrustedDomains {
    domains: Vec<String>,
}

impl TrustedDomains {
    /// Build from apex domains; entries are normalized, malformed ones dropped
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for domain in domains {
            match normalize_hostname(domain.as_ref()) {
                Some(d) if !normalized.contains(&d) => normalized.push(d),
                Some(_) => {}
                None => log::warn!("Ignoring malformed trusted domain: {:?}", domain.as_ref()),
            }
        }
        Self { domains: normalized }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Returns the normalized hostname when it is trusted
    pub fn matched_host(&self, hostname: &str) -> Option<String> {
        let host = normalize_hostname(hostname)?;
        let trusted = self.domains.iter().any(|domain| {
            host == *domain
                || (host.len() > domain.len()
                    && host.ends_with(domain.as_str())
                    && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
        });
        trusted.then_some(host)
    }

    /// True if hostname equals or is a subdomain of a trusted entry
    pub fn is_trusted(&self, hostname: &str) -> bool {
        self.matched_host(hostname).is_some()
    }
}

impl Default for TrustedDomains {
    fn default() -> Self {
        Self::new(DEFAULT_TRUSTED_DOMAINS.iter().copied())
    }
}

// ============================================================================
// HOSTNAME HELPERS
// ============================================================================

/// Normalize a hostname for comparison
///
/// Lower-cases, drops one trailing dot and one leading `www.` label.
/// Returns `None` for anything that is not a plain DNS name.
pub fn normalize_hostname(hostname: &str) -> Option<String> {
    let mut host = hostname.trim().to_ascii_lowercase();

    if host.ends_with('.') {
        host.pop();
    }
    if let Some(stripped) = host.strip_prefix("www.") {
        host = stripped.to_string();
    }

    if host.is_empty() {
        return None;
    }
    let valid_chars = host
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-');
    if !valid_chars || host.split('.').any(str::is_empty) {
        return None;
    }

    Some(host)
}

/// Extract the host component of a URL
///
/// Handles scheme, userinfo, port, path, query and fragment.
/// Bracketed IPv6 literals are returned without brackets.
pub fn host_from_url(url: &str) -> Option<String> {
    let rest = url.trim();
    let rest = match rest.find("://") {
        Some(pos) => &rest[pos + 3..],
        None => rest.strip_prefix("//").unwrap_or(rest),
    };

    let authority = rest
        .split(|c: char| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();

    let host = if let Some(v6) = host_port.strip_prefix('[') {
        v6.split(']').next().unwrap_or_default()
    } else {
        host_port.split(':').next().unwrap_or_default()
    };

    (!host.is_empty()).then(|| host.to_string())
}
