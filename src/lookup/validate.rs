//! Textual IP address validation.

use std::net::IpAddr;
use thiserror::Error;

/// Rejection of a malformed IP address.
///
/// Carries the offending input verbatim so the transport layer can echo it
/// back in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IP address: {input:?}")]
pub struct InvalidIp {
    /// The rejected input, unmodified
    pub input: String,
}

/// Validate a textual IPv4 or IPv6 address.
///
/// Pure and deterministic. The standard parser enforces numeric-range and
/// arity rules and rejects surrounding or embedded whitespace, so empty
/// input, out-of-range octets, and trailing garbage all fail here before
/// any rate-limit accounting or upstream traffic happens.
pub fn validate_ip(raw: &str) -> Result<IpAddr, InvalidIp> {
    raw.parse::<IpAddr>().map_err(|_| InvalidIp {
        input: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ipv4() {
        for valid in ["8.8.8.8", "0.0.0.0", "255.255.255.255", "192.168.1.1"] {
            assert!(validate_ip(valid).is_ok(), "{valid} should parse");
        }
    }

    #[test]
    fn test_accepts_ipv6() {
        for valid in ["::1", "::", "2001:db8::1", "fe80::1", "2001:db8:0:0:0:0:0:1"] {
            assert!(validate_ip(valid).is_ok(), "{valid} should parse");
        }
    }

    #[test]
    fn test_rejects_malformed_input() {
        for invalid in [
            "",
            "999.999.999.999",
            "256.0.0.1",
            "1.2.3",
            "1.2.3.4.5",
            "1.2.3.4x",
            "x1.2.3.4",
            " 8.8.8.8",
            "8.8.8.8 ",
            "8.8. 8.8",
            "8.8.8.8\n",
            "2001:db8::g",
            "::1::2",
            "not-an-ip",
        ] {
            assert!(validate_ip(invalid).is_err(), "{invalid:?} should be rejected");
        }
    }

    #[test]
    fn test_error_quotes_input_verbatim() {
        let err = validate_ip("999.999.999.999").unwrap_err();
        assert_eq!(err.input, "999.999.999.999");
        assert!(err.to_string().contains("999.999.999.999"));
    }
}
