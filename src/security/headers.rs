//! Header-name sets used by request capture.
//!
//! # Responsibilities
//! - Canonicalize configured header names (`x-real-ip` → `X-Real-Ip`)
//! - Hold the excluded-header set and the IP-forwarding priority list
//!
//! # Design Decisions
//! - Built once at startup, shared read-only through `Arc<HeaderConfig>`
//! - Lookups are case-insensitive; configured order is preserved for IP forwarding

use axum::http::{HeaderMap, HeaderName};
use thiserror::Error;

/// Default excluded headers.
pub const DEFAULT_EXCLUDED_HEADERS: &str = "Cookie";

/// Default IP-forwarding headers, highest priority first.
pub const DEFAULT_IP_FORWARDING_HEADERS: &str = "X-Forwarded-For,X-Real-Ip";

/// Environment variable for the excluded headers (read by the CLI layer).
pub const EXCLUDED_HEADERS_ENV: &str = "KAFKA_RAW_HEADERS_HTTP_EXCLUDED";

/// Environment variable for the IP-forwarding headers (read by the CLI layer).
pub const IP_FORWARDING_HEADERS_ENV: &str = "KAFKA_RAW_HTTP_HEADERS_IP_FORWARDING";

/// A configured header name is not a valid HTTP token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid header name: {0:?}")]
pub struct HeaderNameError(pub String);

/// Canonical MIME-style form of a header name.
///
/// The first letter and any letter following a hyphen are upper-cased, the rest lower-cased.
/// Names containing characters outside the token set are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// An ordered, de-duplicated set of canonical header names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, HeaderName)>,
}

impl HeaderSet {
    /// Build a set from names in priority order.
    ///
    /// Names are trimmed, blank entries skipped and duplicates dropped (first one wins).
    pub fn from_names<I, S>(names: I) -> Result<Self, HeaderNameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HeaderNameError(name.to_string()))?;
            if set.entries.iter().any(|(_, h)| *h == header) {
                continue;
            }
            set.entries.push((canonical_header_name(name), header));
        }
        Ok(set)
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(canonical, _)| canonical.eq_ignore_ascii_case(name))
    }

    /// Canonical names in configured order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(canonical, _)| canonical.as_str())
    }

    /// First value of each configured header present in `headers`, in configured order.
    pub fn first_values<'a>(
        &'a self,
        headers: &'a HeaderMap,
    ) -> impl Iterator<Item = (&'a str, Option<&'a [u8]>)> + 'a {
        self.entries.iter().map(move |(canonical, header)| {
            (canonical.as_str(), headers.get(header).map(|v| v.as_bytes()))
        })
    }
}

/// Header configuration shared by all request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConfig {
    /// Headers that must not be stored downstream. Order is irrelevant.
    pub excluded: HeaderSet,
    /// Headers consulted for the client IP, highest priority first.
    pub ip_forwarding: HeaderSet,
}

impl HeaderConfig {
    /// Build from configured name lists.
    pub fn from_lists<E, F>(excluded: E, ip_forwarding: F) -> Result<Self, HeaderNameError>
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Ok(Self {
            excluded: HeaderSet::from_names(excluded)?,
            ip_forwarding: HeaderSet::from_names(ip_forwarding)?,
        })
    }
}
