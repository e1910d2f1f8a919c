//! Upstream ASN data sources.

mod bgpview;
mod record;
mod whois;

pub use bgpview::BgpView;
pub use record::AsnRecord;
pub use whois::CymruWhois;

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure modes of an upstream lookup.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream did not answer within the allotted time
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream could not be contacted at all
    #[error("unable to reach upstream: {0}")]
    Unreachable(String),

    /// The upstream answered with something we could not interpret
    #[error("unexpected upstream response: {0}")]
    BadResponse(String),

    /// The upstream has no origin data for this address. A valid empty
    /// result, not a transport failure.
    #[error("no origin data for {0}")]
    NotFound(IpAddr),
}

impl UpstreamError {
    /// Whether this is the "no data" answer rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::NotFound(_))
    }
}

/// Trait for ASN data sources.
///
/// This trait abstracts over the Team Cymru whois client and the BGPView
/// HTTP client so the lookup service can fail over between them. An
/// implementation issues exactly one outbound call per invocation and
/// enforces `timeout` as a hard bound on the whole exchange; retry and
/// failover policy live with the caller.
#[async_trait]
pub trait AsnResolver: Send + Sync {
    /// Short identifier of the data source, recorded on results and used
    /// in logs.
    fn source(&self) -> &'static str;

    /// Resolve the origin ASN for `ip`.
    async fn resolve(&self, ip: IpAddr, timeout: Duration) -> Result<AsnRecord, UpstreamError>;
}
