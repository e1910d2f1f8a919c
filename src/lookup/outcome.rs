//! Request outcomes consumed by the transport boundary.

use serde::Serialize;

use crate::upstream::{AsnRecord, UpstreamError};

/// The result of one lookup request.
///
/// Every request produces exactly one variant; the transport layer maps
/// each to a protocol response and is forced to handle all four.
#[derive(Debug)]
pub enum LookupOutcome {
    /// Admitted and resolved (possibly to the unknown record)
    Admitted(AsnRecord),
    /// The input was not a valid IP address; no quota was consumed
    RejectedInvalidInput {
        /// User-facing diagnostic quoting the offending input
        reason: String,
    },
    /// The client is over quota
    RejectedRateLimited {
        /// Whole seconds until the client's window resets, at least 1
        retry_after_secs: u64,
    },
    /// Every configured upstream failed
    RejectedUpstreamFailure(UpstreamError),
}

/// The result of one batch lookup request.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Per-item results, in request order
    Completed(Vec<BatchItem>),
    /// The batch itself was malformed (size bounds)
    RejectedInvalidRequest {
        /// User-facing diagnostic
        reason: String,
    },
    /// The client is over quota; no items were processed
    RejectedRateLimited {
        /// Whole seconds until the client's window resets, at least 1
        retry_after_secs: u64,
    },
}

/// Outcome of a single address inside a batch.
///
/// Exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct BatchItem {
    /// The address as submitted
    pub ip: String,
    /// The resolved record, when the lookup succeeded
    pub result: Option<AsnRecord>,
    /// Diagnostic for a failed item
    pub error: Option<String>,
}

impl BatchItem {
    pub(crate) fn ok(ip: impl Into<String>, record: AsnRecord) -> Self {
        Self {
            ip: ip.into(),
            result: Some(record),
            error: None,
        }
    }

    pub(crate) fn failed(ip: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            result: None,
            error: Some(error.into()),
        }
    }
}
