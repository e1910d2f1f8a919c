//! BGPView HTTP client, the fallback ASN data source.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{AsnRecord, AsnResolver, UpstreamError};

const SOURCE: &str = "bgpview.io";

/// Client for the BGPView `GET /ip/{ip}` endpoint.
pub struct BgpView {
    client: reqwest::Client,
    base_url: String,
}

/// Top-level BGPView response envelope.
#[derive(Debug, Deserialize)]
struct IpResponse {
    #[serde(default)]
    data: IpData,
}

#[derive(Debug, Default, Deserialize)]
struct IpData {
    #[serde(default)]
    prefixes: Vec<PrefixEntry>,
    #[serde(default)]
    rir_allocation: RirAllocation,
}

#[derive(Debug, Deserialize)]
struct PrefixEntry {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    asn: Option<AsnEntry>,
}

#[derive(Debug, Deserialize)]
struct AsnEntry {
    #[serde(default)]
    asn: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description_short: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RirAllocation {
    #[serde(default)]
    rir_name: Option<String>,
    #[serde(default)]
    date_allocated: Option<String>,
}

impl BgpView {
    /// Create a client against the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AsnResolver for BgpView {
    fn source(&self) -> &'static str {
        SOURCE
    }

    async fn resolve(&self, ip: IpAddr, timeout: Duration) -> Result<AsnRecord, UpstreamError> {
        let url = format!("{}/ip/{}", self.base_url.trim_end_matches('/'), ip);
        trace!(url = %url, "Querying BGPView");

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_request_error(e, timeout))?;

        if !response.status().is_success() {
            return Err(UpstreamError::BadResponse(format!(
                "HTTP {} from {}",
                response.status(),
                SOURCE
            )));
        }

        let payload: IpResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::BadResponse(e.to_string()))?;

        record_from_payload(ip, payload)
    }
}

fn classify_request_error(err: reqwest::Error, timeout: Duration) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout(timeout)
    } else {
        UpstreamError::Unreachable(err.to_string())
    }
}

/// Map a BGPView payload onto a record, mirroring the whois field set.
fn record_from_payload(ip: IpAddr, payload: IpResponse) -> Result<AsnRecord, UpstreamError> {
    let Some(first) = payload.data.prefixes.into_iter().next() else {
        return Err(UpstreamError::NotFound(ip));
    };

    let asn_entry = first
        .asn
        .ok_or_else(|| UpstreamError::BadResponse("prefix entry without ASN".to_string()))?;
    let asn = asn_entry
        .asn
        .ok_or_else(|| UpstreamError::BadResponse("missing AS number".to_string()))?;

    let rir = payload.data.rir_allocation;
    let as_name = asn_entry
        .description_short
        .or(asn_entry.name)
        .unwrap_or_default();

    Ok(AsnRecord {
        ip: ip.to_string(),
        asn,
        bgp_prefix: first.prefix.unwrap_or_default(),
        country_code: asn_entry.country_code.unwrap_or_default(),
        registry: rir.rir_name.unwrap_or_default().to_lowercase(),
        allocated_date: rir.date_allocated.unwrap_or_default(),
        as_name,
        source: SOURCE.to_string(),
    })
}
