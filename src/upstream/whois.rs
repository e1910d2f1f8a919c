//! Team Cymru whois client, the primary ASN data source.
//!
//! The IP-to-ASN mapping service speaks the whois protocol: one TCP
//! connection per query, a ` -v <ip>` request line, and a pipe-separated
//! verbose response of the form
//!
//! ```text
//! AS      | IP               | BGP Prefix          | CC | Registry | Allocated  | AS Name
//! 15169   | 8.8.8.8          | 8.8.8.0/24          | US | arin     | 1992-12-01 | GOOGLE, US
//! ```
//!
//! Unrouted space is reported with `NA` in the AS column.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

use super::{AsnRecord, AsnResolver, UpstreamError};

const SOURCE: &str = "team-cymru-whois";

/// Client for the Team Cymru whois interface.
pub struct CymruWhois {
    host: String,
    port: u16,
}

impl CymruWhois {
    /// Create a client for the given whois endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Run one whois exchange and return the raw response text.
    async fn query(&self, ip: IpAddr) -> Result<String, UpstreamError> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        stream
            .write_all(format!(" -v {ip}\n").as_bytes())
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;
        // Half-close the write side; the server answers and then closes.
        stream
            .shutdown()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[async_trait]
impl AsnResolver for CymruWhois {
    fn source(&self) -> &'static str {
        SOURCE
    }

    async fn resolve(&self, ip: IpAddr, timeout: Duration) -> Result<AsnRecord, UpstreamError> {
        let raw = tokio::time::timeout(timeout, self.query(ip))
            .await
            .map_err(|_| UpstreamError::Timeout(timeout))??;

        trace!(ip = %ip, bytes = raw.len(), "Received whois response");
        parse_response(ip, &raw)
    }
}

/// Parse a full whois response: a header line followed by one data line.
fn parse_response(ip: IpAddr, raw: &str) -> Result<AsnRecord, UpstreamError> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(UpstreamError::BadResponse(
            "missing data line in whois response".to_string(),
        ));
    }

    parse_verbose_line(ip, lines[lines.len() - 1])
}

/// Parse one pipe-separated verbose data line into a record.
fn parse_verbose_line(ip: IpAddr, line: &str) -> Result<AsnRecord, UpstreamError> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    if parts.len() < 7 {
        return Err(UpstreamError::BadResponse(format!(
            "expected 7 whois columns, got {}",
            parts.len()
        )));
    }

    let asn_text = parts[0].to_uppercase();
    let asn_text = asn_text.trim_start_matches("AS").trim();
    if asn_text == "NA" {
        return Err(UpstreamError::NotFound(ip));
    }
    let asn: u32 = asn_text
        .parse()
        .map_err(|_| UpstreamError::BadResponse(format!("invalid AS number {:?}", parts[0])))?;

    Ok(AsnRecord {
        ip: ip.to_string(),
        asn,
        bgp_prefix: parts[2].to_string(),
        country_code: parts[3].to_string(),
        registry: parts[4].to_string(),
        allocated_date: parts[5].to_string(),
        as_name: parts[6].to_string(),
        source: SOURCE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const HEADER: &str =
        "AS      | IP               | BGP Prefix          | CC | Registry | Allocated  | AS Name";

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_verbose_line() {
        let line = "3462    | 118.163.137.149  | 118.163.128.0/17    | TW | apnic    | 2006-04-20 | HINET Data Communication Business Group";
        let record = parse_verbose_line(ip("118.163.137.149"), line).unwrap();

        assert_eq!(record.asn, 3462);
        assert_eq!(record.bgp_prefix, "118.163.128.0/17");
        assert_eq!(record.country_code, "TW");
        assert_eq!(record.registry, "apnic");
        assert_eq!(record.allocated_date, "2006-04-20");
        assert_eq!(record.as_name, "HINET Data Communication Business Group");
        assert_eq!(record.source, SOURCE);
    }

    #[test]
    fn test_parse_tolerates_as_prefix() {
        let line = "AS15169 | 8.8.8.8 | 8.8.8.0/24 | US | arin | 1992-12-01 | GOOGLE, US";
        let record = parse_verbose_line(ip("8.8.8.8"), line).unwrap();
        assert_eq!(record.asn, 15169);
    }

    #[test]
    fn test_na_column_is_not_found() {
        let line = "NA | 192.0.2.1 | NA | NA | NA | NA | NA";
        let err = parse_verbose_line(ip("192.0.2.1"), line).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_short_line_is_bad_response() {
        let err = parse_verbose_line(ip("8.8.8.8"), "15169 | 8.8.8.8").unwrap_err();
        assert!(matches!(err, UpstreamError::BadResponse(_)));
    }

    #[test]
    fn test_garbage_asn_is_bad_response() {
        let line = "whoops | 8.8.8.8 | 8.8.8.0/24 | US | arin | 1992-12-01 | GOOGLE, US";
        let err = parse_verbose_line(ip("8.8.8.8"), line).unwrap_err();
        assert!(matches!(err, UpstreamError::BadResponse(_)));
    }

    #[test]
    fn test_header_only_response_is_bad_response() {
        let err = parse_response(ip("8.8.8.8"), HEADER).unwrap_err();
        assert!(matches!(err, UpstreamError::BadResponse(_)));
    }

    /// Serve one canned whois response on a local listener.
    async fn whois_fixture(response: &'static str) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            socket.read_to_end(&mut request).await.unwrap();
            assert!(String::from_utf8_lossy(&request).contains("-v 8.8.8.8"));
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_resolve_against_local_fixture() {
        let addr = whois_fixture(
            "AS      | IP      | BGP Prefix | CC | Registry | Allocated  | AS Name\n\
             15169   | 8.8.8.8 | 8.8.8.0/24 | US | arin     | 1992-12-01 | GOOGLE, US\n",
        )
        .await;

        let client = CymruWhois::new(addr.ip().to_string(), addr.port());
        let record = client
            .resolve(ip("8.8.8.8"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(record.asn, 15169);
        assert_eq!(record.as_name, "GOOGLE, US");
        assert_eq!(record.source, SOURCE);
    }

    #[tokio::test]
    async fn test_resolve_times_out_on_silent_server() {
        // A listener that accepts and then never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = CymruWhois::new(addr.ip().to_string(), addr.port());
        let err = client
            .resolve(ip("8.8.8.8"), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_resolve_unreachable_endpoint() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = CymruWhois::new(addr.ip().to_string(), addr.port());
        let err = client
            .resolve(ip("8.8.8.8"), Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Unreachable(_)));
    }
}
