//! Single-address probe
//!
//! A probe walks three stages against one candidate: parse the address,
//! open a TCP connection to the edge port, then fetch the trace endpoint
//! over HTTPS with name resolution pinned to the candidate. Every stage
//! returns `Result<_, ProbeFailure>`; the first failure ends the probe and
//! becomes the outcome. All stages share one deadline, so a probe never
//! outlives the timeout it was given.

use crate::{
    models::{Config, ProbeOutcome},
    types::{FailureReason, ProbeFailure, ProbeStage},
};
use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::{
    net::TcpStream,
    time::{timeout_at, Instant},
};

/// Tests one candidate address
///
/// Implementations must not fail: every problem is reported through the
/// returned outcome.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str, timeout: Duration) -> ProbeOutcome;
}

/// Where and how the verification request is sent
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    /// Edge port for both the TCP handshake and the request
    pub port: u16,
    /// `https` in production
    pub scheme: String,
    /// Host name sent in SNI and the Host header; resolved to the candidate
    pub trace_host: String,
    pub trace_path: String,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            port: crate::defaults::EDGE_PORT,
            scheme: "https".to_string(),
            trace_host: crate::defaults::DEFAULT_TRACE_HOST.to_string(),
            trace_path: crate::defaults::TRACE_PATH.to_string(),
            user_agent: format!("{}/{}", crate::PKG_NAME, crate::VERSION),
        }
    }
}

impl From<&Config> for ProbeSettings {
    fn from(config: &Config) -> Self {
        Self {
            trace_host: config.trace_host.clone(),
            ..Self::default()
        }
    }
}

/// Production prober: TCP connect, then HTTPS GET of the trace path
#[derive(Debug, Clone, Default)]
pub struct HttpsProber {
    settings: ProbeSettings,
}

impl HttpsProber {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ProbeSettings::from(config))
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    fn trace_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.settings.scheme, self.settings.trace_host, self.settings.port, self.settings.trace_path
        )
    }

    async fn run_stages(&self, address: &str, deadline: Instant) -> Result<(), ProbeFailure> {
        let ip = parse_candidate(address)?;
        let socket = SocketAddr::new(IpAddr::V4(ip), self.settings.port);

        self.connect(socket, deadline).await?;
        self.verify(socket, deadline).await
    }

    async fn connect(&self, socket: SocketAddr, deadline: Instant) -> Result<(), ProbeFailure> {
        match timeout_at(deadline, TcpStream::connect(socket)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(ProbeFailure::connection(e.to_string())),
            Err(_) => Err(ProbeFailure::timeout(ProbeStage::Connect)),
        }
    }

    async fn verify(&self, socket: SocketAddr, deadline: Instant) -> Result<(), ProbeFailure> {
        let budget = remaining(deadline, ProbeStage::Verify)?;

        let client = Client::builder()
            .resolve(&self.settings.trace_host, socket)
            .no_proxy()
            .redirect(redirect::Policy::none())
            .connect_timeout(budget)
            .timeout(budget)
            .user_agent(self.settings.user_agent.as_str())
            .build()
            .map_err(|e| ProbeFailure::request(format!("client setup: {}", e)))?;

        let response = match timeout_at(deadline, client.get(self.trace_url()).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => return Err(ProbeFailure::timeout(ProbeStage::Verify)),
            Ok(Err(e)) if e.is_connect() => {
                return Err(ProbeFailure::new(ProbeStage::Verify, FailureReason::Connection(e.to_string())));
            }
            Ok(Err(e)) => return Err(ProbeFailure::request(e.to_string())),
            Err(_) => return Err(ProbeFailure::timeout(ProbeStage::Verify)),
        };

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(ProbeFailure::status(response.status().as_u16()))
        }
    }
}

#[async_trait]
impl Prober for HttpsProber {
    async fn probe(&self, address: &str, timeout: Duration) -> ProbeOutcome {
        let started = Instant::now();
        let deadline = started + timeout;

        match self.run_stages(address, deadline).await {
            Ok(()) => ProbeOutcome::available(address, started.elapsed().as_secs_f64() * 1000.0),
            Err(failure) => ProbeOutcome::unavailable(address, failure),
        }
    }
}

/// Parse a candidate string as a dotted-quad IPv4 address
pub fn parse_candidate(address: &str) -> Result<Ipv4Addr, ProbeFailure> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ProbeFailure::invalid_address("empty address"));
    }

    match trimmed.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(_)) => Err(ProbeFailure::invalid_address(format!("{} is IPv6, only IPv4 is probed", trimmed))),
        Err(e) => Err(ProbeFailure::invalid_address(format!("{}: {}", trimmed, e))),
    }
}

fn remaining(deadline: Instant, stage: ProbeStage) -> Result<Duration, ProbeFailure> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(ProbeFailure::timeout(stage))
    } else {
        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plain_http_settings(port: u16) -> ProbeSettings {
        ProbeSettings {
            port,
            scheme: "http".to_string(),
            trace_host: "edge.test".to_string(),
            ..ProbeSettings::default()
        }
    }

    #[test]
    fn test_parse_candidate() {
        assert_eq!(parse_candidate("1.1.1.1").unwrap(), Ipv4Addr::new(1, 1, 1, 1));
        assert_eq!(parse_candidate(" 104.16.0.9\n").unwrap(), Ipv4Addr::new(104, 16, 0, 9));

        for bad in ["", "256.1.1.1", "1.1.1", "cloudflare.com", "2606:4700::1111"] {
            let failure = parse_candidate(bad).unwrap_err();
            assert_eq!(failure.stage, ProbeStage::Address, "{:?} should fail parsing", bad);
        }
    }

    #[test]
    fn test_default_settings_target_trace_endpoint() {
        let prober = HttpsProber::default();
        assert_eq!(prober.settings().port, 443);
        assert_eq!(prober.trace_url(), "https://www.cloudflare.com:443/cdn-cgi/trace");
    }

    #[test]
    fn test_settings_from_config_use_trace_host() {
        let config = Config {
            trace_host: "speed.cloudflare.com".to_string(),
            ..Config::default()
        };
        let prober = HttpsProber::from_config(&config);
        assert_eq!(prober.settings().trace_host, "speed.cloudflare.com");
        assert_eq!(prober.settings().trace_path, "/cdn-cgi/trace");
    }

    #[tokio::test]
    async fn test_malformed_address_is_unavailable() {
        let outcome = HttpsProber::default().probe("not-an-ip", Duration::from_secs(1)).await;

        assert!(!outcome.is_available());
        assert_eq!(outcome.address(), "not-an-ip");
        assert_eq!(outcome.failure().unwrap().stage, ProbeStage::Address);
    }

    #[tokio::test]
    async fn test_refused_connection_fails_connect_stage() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = HttpsProber::new(plain_http_settings(port));
        let outcome = prober.probe("127.0.0.1", Duration::from_secs(2)).await;

        assert!(!outcome.is_available());
        assert_eq!(outcome.failure().unwrap().stage, ProbeStage::Connect);
    }

    #[tokio::test]
    async fn test_trace_endpoint_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cdn-cgi/trace"))
            .and(header("host", format!("edge.test:{}", server.address().port()).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("fl=1\nip=127.0.0.1\nwarp=off\n"))
            .expect(1)
            .mount(&server)
            .await;

        let prober = HttpsProber::new(plain_http_settings(server.address().port()));
        let outcome = prober.probe("127.0.0.1", Duration::from_secs(5)).await;

        assert!(outcome.is_available(), "unexpected failure: {:?}", outcome.failure());
        let latency = outcome.latency_millis().unwrap();
        assert!(latency > 0.0 && latency < 5000.0);
    }

    #[tokio::test]
    async fn test_non_200_status_fails_verify_stage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cdn-cgi/trace"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let prober = HttpsProber::new(plain_http_settings(server.address().port()));
        let outcome = prober.probe("127.0.0.1", Duration::from_secs(5)).await;

        assert!(!outcome.is_available());
        assert_eq!(outcome.failure(), Some(&ProbeFailure::status(403)));
    }

    #[tokio::test]
    async fn test_non_tls_peer_fails_verify_stage() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let settings = ProbeSettings {
            port,
            trace_host: "edge.test".to_string(),
            ..ProbeSettings::default()
        };
        let outcome = HttpsProber::new(settings).probe("127.0.0.1", Duration::from_secs(2)).await;

        assert!(!outcome.is_available());
        assert_eq!(outcome.failure().unwrap().stage, ProbeStage::Verify);
    }

    #[tokio::test]
    async fn test_silent_peer_times_out_within_budget() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let prober = HttpsProber::new(plain_http_settings(port));
        let started = std::time::Instant::now();
        let outcome = prober.probe("127.0.0.1", Duration::from_millis(300)).await;

        assert!(!outcome.is_available());
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.stage, ProbeStage::Verify);
        assert!(failure.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
