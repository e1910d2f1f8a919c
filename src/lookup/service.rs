//! The lookup orchestrator.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::ratelimit::{ClientKey, RateLimiter};
use crate::upstream::{AsnRecord, AsnResolver, UpstreamError};

use super::outcome::{BatchItem, BatchOutcome, LookupOutcome};
use super::validate::validate_ip;

/// Largest number of addresses accepted in one batch request.
pub const MAX_BATCH_SIZE: usize = 100;

/// Orchestrates validation, admission, and upstream resolution for lookup
/// requests.
///
/// Stateless apart from the shared limiter; freely re-entrant across
/// concurrent requests.
pub struct LookupService {
    limiter: Arc<RateLimiter>,
    primary: Arc<dyn AsnResolver>,
    fallback: Option<Arc<dyn AsnResolver>>,
    upstream_timeout: Duration,
}

impl LookupService {
    /// Create a service over the given limiter and resolvers.
    pub fn new(
        limiter: Arc<RateLimiter>,
        primary: Arc<dyn AsnResolver>,
        fallback: Option<Arc<dyn AsnResolver>>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            limiter,
            primary,
            fallback,
            upstream_timeout,
        }
    }

    /// Handle one lookup request end to end.
    ///
    /// Validation runs before admission, so malformed input never consumes
    /// quota. Admission is consumed at admission time and is not refunded
    /// if the upstream call later fails.
    pub async fn handle_lookup(&self, raw_ip: &str, client: &ClientKey) -> LookupOutcome {
        let ip = match validate_ip(raw_ip) {
            Ok(ip) => ip,
            Err(err) => {
                debug!(client = %client, input = raw_ip, "Rejected invalid input");
                return LookupOutcome::RejectedInvalidInput {
                    reason: err.to_string(),
                };
            }
        };

        let admission = self.limiter.try_admit(client, Instant::now());
        if let Some(retry_after_secs) = admission.retry_after_secs() {
            debug!(client = %client, retry_after_secs, "Rate limit exceeded");
            return LookupOutcome::RejectedRateLimited { retry_after_secs };
        }

        match self.resolve_with_failover(ip).await {
            Ok(record) => LookupOutcome::Admitted(record),
            Err(err) if err.is_not_found() => {
                debug!(ip = %ip, "No origin data upstream");
                LookupOutcome::Admitted(AsnRecord::unknown(ip))
            }
            Err(err) => {
                warn!(ip = %ip, error = %err, "Upstream lookup failed");
                LookupOutcome::RejectedUpstreamFailure(err)
            }
        }
    }

    /// Handle one batch request.
    ///
    /// The batch consumes a single admission slot; individual addresses are
    /// validated and resolved independently, with failures captured per
    /// item instead of failing the batch.
    pub async fn handle_batch(&self, ips: &[String], client: &ClientKey) -> BatchOutcome {
        if ips.is_empty() || ips.len() > MAX_BATCH_SIZE {
            return BatchOutcome::RejectedInvalidRequest {
                reason: format!("ips must contain between 1 and {MAX_BATCH_SIZE} entries"),
            };
        }

        let admission = self.limiter.try_admit(client, Instant::now());
        if let Some(retry_after_secs) = admission.retry_after_secs() {
            debug!(client = %client, retry_after_secs, "Rate limit exceeded for batch");
            return BatchOutcome::RejectedRateLimited { retry_after_secs };
        }

        let mut items = Vec::with_capacity(ips.len());
        for raw in ips {
            items.push(self.lookup_item(raw).await);
        }
        BatchOutcome::Completed(items)
    }

    /// Resolve one batch item without touching the limiter.
    async fn lookup_item(&self, raw_ip: &str) -> BatchItem {
        let ip = match validate_ip(raw_ip) {
            Ok(ip) => ip,
            Err(err) => return BatchItem::failed(raw_ip, err.to_string()),
        };

        match self.resolve_with_failover(ip).await {
            Ok(record) => BatchItem::ok(raw_ip, record),
            Err(err) if err.is_not_found() => BatchItem::ok(raw_ip, AsnRecord::unknown(ip)),
            Err(err) => BatchItem::failed(raw_ip, err.to_string()),
        }
    }

    /// Ask the primary resolver, falling over to the fallback at most once.
    ///
    /// A primary `NotFound` also consults the fallback: the secondary
    /// source sometimes carries allocation data the primary lacks. When
    /// both attempts fail the fallback's error wins, matching what the
    /// caller last observed.
    async fn resolve_with_failover(&self, ip: IpAddr) -> Result<AsnRecord, UpstreamError> {
        let primary_err = match self.primary.resolve(ip, self.upstream_timeout).await {
            Ok(record) => return Ok(record),
            Err(err) => err,
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_err);
        };

        warn!(
            source = self.primary.source(),
            error = %primary_err,
            "Primary resolver failed, trying fallback"
        );
        fallback.resolve(ip, self.upstream_timeout).await
    }
}
