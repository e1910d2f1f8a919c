//! The resolved ASN answer.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Origin data for a single IP address.
///
/// Immutable once produced by a resolver; `source` names the data source
/// that answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnRecord {
    /// The queried address, normalized
    pub ip: String,
    /// Origin autonomous system number; 0 when unknown
    pub asn: u32,
    /// Covering BGP prefix
    pub bgp_prefix: String,
    /// ISO country code
    pub country_code: String,
    /// Regional internet registry
    pub registry: String,
    /// Allocation date as reported by the registry
    pub allocated_date: String,
    /// Operator name of the autonomous system
    pub as_name: String,
    /// Which upstream produced this record
    pub source: String,
}

impl AsnRecord {
    /// The answer for an address no upstream has origin data for.
    pub fn unknown(ip: IpAddr) -> Self {
        Self {
            ip: ip.to_string(),
            asn: 0,
            bgp_prefix: String::new(),
            country_code: String::new(),
            registry: String::new(),
            allocated_date: String::new(),
            as_name: String::new(),
            source: String::new(),
        }
    }

    /// Whether this record carries no origin data.
    pub fn is_unknown(&self) -> bool {
        self.asn == 0
    }
}
