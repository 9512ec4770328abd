//! Published address ranges: download and parsing

use crate::{AppError, Result};
use ipnetwork::Ipv4Network;
use reqwest::Client;
use std::time::Duration;

/// Default timeout for the range document request
const RANGES_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Ranges read from a range document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRanges {
    /// Valid IPv4 networks in document order, without duplicates
    pub networks: Vec<Ipv4Network>,
    /// Lines that were neither blank, comments nor IPv4 CIDRs
    pub rejected: Vec<String>,
}

impl ParsedRanges {
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

/// Parse a range document: one CIDR per line
///
/// Blank lines and `#` comments are skipped. A bare address counts as a
/// /32. IPv6 and malformed lines are collected in `rejected`.
pub fn parse_ranges(text: &str) -> ParsedRanges {
    let mut parsed = ParsedRanges::default();

    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        match line.parse::<Ipv4Network>() {
            Ok(network) => {
                if !parsed.networks.contains(&network) {
                    parsed.networks.push(network);
                }
            }
            Err(_) => parsed.rejected.push(line.to_string()),
        }
    }

    parsed
}

/// Downloads the provider's published IPv4 ranges
pub struct RangeFetcher {
    client: Client,
}

impl RangeFetcher {
    /// Create a fetcher with the default request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(RANGES_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::candidates(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch and parse the range document at `url`
    pub async fn fetch(&self, url: &str) -> Result<ParsedRanges> {
        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::candidates(format!("Failed to fetch IP ranges from '{}': {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::candidates(format!(
                "IP range request to '{}' returned status {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::candidates(format!("Failed to read IP ranges from '{}': {}", url, e)))?;

        Ok(parse_ranges(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCUMENT: &str = "173.245.48.0/20\n103.21.244.0/22\n\n# edge\n104.16.0.0/13\n";

    #[test]
    fn test_parse_ranges() {
        let parsed = parse_ranges(DOCUMENT);
        assert_eq!(parsed.networks.len(), 3);
        assert_eq!(parsed.networks[0].to_string(), "173.245.48.0/20");
        assert_eq!(parsed.networks[2].prefix(), 13);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_parse_ranges_rejects_ipv6_and_garbage() {
        let parsed = parse_ranges("2400:cb00::/32\n1.1.1.0/24\nnot a range\n10.0.0.0/33\r\n");
        assert_eq!(parsed.networks.len(), 1);
        assert_eq!(parsed.rejected, vec!["2400:cb00::/32", "not a range", "10.0.0.0/33"]);
    }

    #[test]
    fn test_parse_ranges_handles_crlf_duplicates_and_bare_addresses() {
        let parsed = parse_ranges("1.1.1.0/24\r\n1.1.1.0/24\r\n1.0.0.1 # resolver\r\n");
        assert_eq!(parsed.networks.len(), 2);
        assert_eq!(parsed.networks[1].prefix(), 32);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_ranges("").is_empty());
        assert!(parse_ranges("\n# nothing\n").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_ranges() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ips-v4"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DOCUMENT))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = RangeFetcher::new().unwrap();
        let parsed = fetcher.fetch(&format!("{}/ips-v4", server.uri())).await.unwrap();
        assert_eq!(parsed.networks.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_candidate_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ips-v4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = RangeFetcher::new().unwrap();
        let err = fetcher.fetch(&format!("{}/ips-v4", server.uri())).await.unwrap_err();
        assert_eq!(err.category(), "CANDIDATES");
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_candidate_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = RangeFetcher::with_timeout(Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch(&format!("http://127.0.0.1:{}/ips-v4", port)).await.unwrap_err();
        assert_eq!(err.category(), "CANDIDATES");
    }
}
