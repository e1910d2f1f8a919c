//! Client identity used for rate limit accounting.

use std::net::IpAddr;

/// A key that identifies the client a request is accounted against.
///
/// The key is opaque to the limiter: it is compared and hashed, never
/// interpreted. For HTTP traffic it is derived from the first
/// `X-Forwarded-For` hop when present, otherwise from the peer address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Create a client key from an arbitrary identity string.
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Derive a client key from request metadata.
    ///
    /// `forwarded_for` is the raw `X-Forwarded-For` header value, if any.
    /// Only the first (client-most) hop is used; proxies append their own
    /// entries after it.
    pub fn from_request(forwarded_for: Option<&str>, peer: IpAddr) -> Self {
        if let Some(header) = forwarded_for {
            if let Some(first) = header.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Self(first.to_string());
                }
            }
        }
        Self(peer.to_string())
    }

    /// The identity string backing this key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_first_hop_wins() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        let key = ClientKey::from_request(Some("203.0.113.7, 10.0.0.2"), peer);
        assert_eq!(key.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_whitespace_trimmed() {
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        let key = ClientKey::from_request(Some("  203.0.113.7  "), peer);
        assert_eq!(key.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_missing_header_falls_back_to_peer() {
        let peer: IpAddr = "192.0.2.9".parse().unwrap();
        let key = ClientKey::from_request(None, peer);
        assert_eq!(key.as_str(), "192.0.2.9");
    }

    #[test]
    fn test_empty_header_falls_back_to_peer() {
        let peer: IpAddr = "192.0.2.9".parse().unwrap();
        let key = ClientKey::from_request(Some(""), peer);
        assert_eq!(key.as_str(), "192.0.2.9");
    }

    #[test]
    fn test_equality() {
        assert_eq!(ClientKey::new("a"), ClientKey::new("a"));
        assert_ne!(ClientKey::new("a"), ClientKey::new("b"));
    }
}
