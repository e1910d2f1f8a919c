//! Configuration management for asnd.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main configuration for the asnd service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsndConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Upstream resolver configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl Default for AsndConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limiting: RateLimitingConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8000".parse().unwrap()
}

/// Rate limiting configuration.
///
/// `max_requests == 0` disables rate limiting entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Maximum requests allowed per client per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between idle-counter eviction sweeps, in seconds
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

fn default_max_requests() -> u32 {
    60
}

fn default_window_secs() -> u64 {
    60
}

fn default_eviction_interval() -> u64 {
    300
}

/// Upstream resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Team Cymru whois host
    #[serde(default = "default_whois_host")]
    pub whois_host: String,

    /// Team Cymru whois port
    #[serde(default = "default_whois_port")]
    pub whois_port: u16,

    /// Base URL of the BGPView fallback API
    #[serde(default = "default_bgpview_url")]
    pub bgpview_url: String,

    /// Hard timeout for a single upstream call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Whether to consult the BGPView fallback when the primary fails
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            whois_host: default_whois_host(),
            whois_port: default_whois_port(),
            bgpview_url: default_bgpview_url(),
            timeout_ms: default_timeout_ms(),
            fallback_enabled: default_fallback_enabled(),
        }
    }
}

fn default_whois_host() -> String {
    "whois.cymru.com".to_string()
}

fn default_whois_port() -> u16 {
    43
}

fn default_bgpview_url() -> String {
    "https://api.bgpview.io".to_string()
}

fn default_timeout_ms() -> u64 {
    4000
}

fn default_fallback_enabled() -> bool {
    true
}

impl AsndConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AsndConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::AsndError::Config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AsndConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8000);
        assert_eq!(config.rate_limiting.max_requests, 60);
        assert_eq!(config.rate_limiting.window_secs, 60);
        assert_eq!(config.upstream.whois_host, "whois.cymru.com");
        assert_eq!(config.upstream.whois_port, 43);
        assert!(config.upstream.fallback_enabled);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
rate_limiting:
  max_requests: 5
  window_secs: 10
"#;
        let config: AsndConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rate_limiting.max_requests, 5);
        assert_eq!(config.rate_limiting.window_secs, 10);
        assert_eq!(config.rate_limiting.eviction_interval_secs, 300);
        assert_eq!(config.upstream.timeout_ms, 4000);
        assert_eq!(config.server.listen_addr.port(), 8000);
    }

    #[test]
    fn test_disabled_limiter_config() {
        let yaml = "rate_limiting:\n  max_requests: 0\n";
        let config: AsndConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.rate_limiting.max_requests, 0);
    }
}
