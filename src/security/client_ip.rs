//! Client IP resolution.
//!
//! The configured IP-forwarding headers are consulted in priority order and the first value
//! that parses as a bare IPv4/IPv6 literal wins. Otherwise the transport peer address is used.
//!
//! Forwarding headers are trusted as-is: deploy behind a reverse proxy that overwrites them.

use std::net::IpAddr;

use axum::http::HeaderMap;
use thiserror::Error;

use crate::security::headers::HeaderSet;

/// Errors from [`resolve_client_ip`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientIpError {
    /// The peer address is not `host:port` or its host is not an IP literal.
    #[error("userip: {0:?} is not IP:port")]
    BadPeerAddress(String),
}

/// Resolve the client IP for a request.
///
/// `peer` is the transport peer address in `host:port` form (`[v6]:port` for IPv6).
pub fn resolve_client_ip(
    headers: &HeaderMap,
    forwarding: &HeaderSet,
    peer: &str,
) -> Result<String, ClientIpError> {
    for (name, value) in forwarding.first_values(headers) {
        let Some(value) = value.and_then(|v| std::str::from_utf8(v).ok()) else {
            continue;
        };
        if is_ip_literal(value) {
            return Ok(value.to_string());
        }
        tracing::trace!(header = name, value, "Ignoring non-IP forwarding header");
    }

    let (host, _port) =
        split_host_port(peer).ok_or_else(|| ClientIpError::BadPeerAddress(peer.to_string()))?;

    if !is_ip_literal(host) {
        return Err(ClientIpError::BadPeerAddress(peer.to_string()));
    }

    Ok(host.to_string())
}

/// Whether `value` is a bare IPv4 or IPv6 address (no port, prefix or zone).
pub fn is_ip_literal(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// Split `host:port` or `[host]:port` into its parts.
///
/// The port must be present but is not validated. A bare host containing colons must be
/// bracketed.
pub fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':')?;
        if host.contains('[') || port.contains(['[', ']']) {
            return None;
        }
        return Some((host, port));
    }

    let (host, port) = addr.rsplit_once(':')?;
    if host.contains(':') || host.contains(['[', ']']) || port.contains(['[', ']']) {
        return None;
    }
    Some((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarding() -> HeaderSet {
        HeaderSet::from_names(["X-Forwarded-For", "X-Real-Ip"]).unwrap()
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn highest_priority_header_wins() {
        let h = headers(&[("x-real-ip", "3.3.3.3"), ("x-forwarded-for", "2.2.2.2")]);
        let ip = resolve_client_ip(&h, &forwarding(), "10.0.0.1:5000").unwrap();
        assert_eq!(ip, "2.2.2.2");
    }

    #[test]
    fn invalid_header_falls_through_to_next() {
        let h = headers(&[
            ("x-forwarded-for", "2.2.2.2, 10.0.0.1"),
            ("x-real-ip", "2001:db8::1"),
        ]);
        let ip = resolve_client_ip(&h, &forwarding(), "10.0.0.1:5000").unwrap();
        assert_eq!(ip, "2001:db8::1");
    }

    #[test]
    fn only_first_header_value_is_considered() {
        let h = headers(&[("x-forwarded-for", "garbage"), ("x-forwarded-for", "4.4.4.4")]);
        let ip = resolve_client_ip(&h, &forwarding(), "203.0.113.5:8080").unwrap();
        assert_eq!(ip, "203.0.113.5");
    }

    #[test]
    fn unconfigured_headers_are_ignored() {
        let h = headers(&[("x-client-ip", "5.5.5.5")]);
        let ip = resolve_client_ip(&h, &forwarding(), "203.0.113.5:8080").unwrap();
        assert_eq!(ip, "203.0.113.5");
    }

    #[test]
    fn falls_back_to_ipv6_peer() {
        let ip = resolve_client_ip(&HeaderMap::new(), &forwarding(), "[::1]:443").unwrap();
        assert_eq!(ip, "::1");
    }

    #[test]
    fn rejects_malformed_peer() {
        for peer in ["203.0.113.5", "", "example.com:80", "::1:80", "[::1]"] {
            let err = resolve_client_ip(&HeaderMap::new(), &forwarding(), peer).unwrap_err();
            assert_eq!(err, ClientIpError::BadPeerAddress(peer.to_string()));
        }
        let err = ClientIpError::BadPeerAddress("203.0.113.5".into());
        assert_eq!(err.to_string(), r#"userip: "203.0.113.5" is not IP:port"#);
    }

    #[test]
    fn ip_literal_rules() {
        assert!(is_ip_literal("192.168.0.1"));
        assert!(is_ip_literal("::ffff:1.2.3.4"));
        assert!(!is_ip_literal("192.168.0.0/24"));
        assert!(!is_ip_literal("192.168.0.1:80"));
        assert!(!is_ip_literal(" 1.1.1.1"));
    }

    #[test]
    fn splits_host_and_port() {
        assert_eq!(split_host_port("1.2.3.4:80"), Some(("1.2.3.4", "80")));
        assert_eq!(split_host_port("[fe80::1]:8080"), Some(("fe80::1", "8080")));
        assert_eq!(split_host_port(":80"), Some(("", "80")));
        assert_eq!(split_host_port("1.2.3.4"), None);
        assert_eq!(split_host_port("[fe80::1]8080"), None);
    }
}
