//! Client for the instance listener service.
//!
//! The listener runs on the infrastructure network, watches DHCP traffic from
//! guest VMs, and serves its current MAC → IP table over HTTP.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("listener request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("listener {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("instance with mac {0} not found in listener table")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Upper bound on one round trip to the listener. Callers retry, so a hung
/// listener must fail an attempt rather than stall it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for one or more listener endpoints.
#[derive(Clone)]
pub struct ListenerClient {
    http: reqwest::Client,
}

impl ListenerClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    fn url(listener: &str, port: u16, path: &str) -> String {
        // Bare IPv6 literals need brackets in a URL authority.
        match listener.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("http://[{ip}]:{port}{path}"),
            _ => format!("http://{listener}:{port}{path}"),
        }
    }

    /// Fetch the full MAC → IP table.
    pub async fn instances(&self, listener: &str, port: u16) -> Result<HashMap<String, String>> {
        let resp = self
            .http
            .get(Self::url(listener, port, "/instances"))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                endpoint: "list instances",
                status,
                body,
            });
        }

        resp.json().await.map_err(Error::from)
    }

    /// IP address the listener has observed for `mac`.
    ///
    /// MACs are compared case-insensitively; the listener and the hypervisor
    /// do not agree on hex casing.
    pub async fn instance_ip(&self, listener: &str, port: u16, mac: &str) -> Result<String> {
        let table = self.instances(listener, port).await?;

        table
            .into_iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(mac))
            .map(|(_, ip)| ip)
            .ok_or_else(|| Error::NotFound(mac.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn listener(table: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(table))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn resolves_known_mac() {
        let server = listener(json!({
            "00:11:22:33:44:55": "10.0.0.5",
            "00:11:22:33:44:66": "10.0.0.6"
        }))
        .await;
        let addr = server.address();

        let ip = ListenerClient::new()
            .unwrap()
            .instance_ip(&addr.ip().to_string(), addr.port(), "00:11:22:33:44:55")
            .await
            .unwrap();
        assert_eq!(ip, "10.0.0.5");
    }

    #[tokio::test]
    async fn mac_lookup_ignores_case() {
        let server = listener(json!({ "00:50:56:AB:CD:EF": "10.0.0.9" })).await;
        let addr = server.address();

        let ip = ListenerClient::new()
            .unwrap()
            .instance_ip(&addr.ip().to_string(), addr.port(), "00:50:56:ab:cd:ef")
            .await
            .unwrap();
        assert_eq!(ip, "10.0.0.9");
    }

    #[tokio::test]
    async fn unknown_mac_is_not_found() {
        let server = listener(json!({})).await;
        let addr = server.address();

        let err = ListenerClient::new()
            .unwrap()
            .instance_ip(&addr.ip().to_string(), addr.port(), "00:11:22:33:44:55")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(mac) if mac == "00:11:22:33:44:55"));
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instances"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let addr = server.address();

        let err = ListenerClient::new()
            .unwrap()
            .instances(&addr.ip().to_string(), addr.port())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status, .. } if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn slow_listener_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instances"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        let addr = server.address();

        let err = ListenerClient::with_timeout(Duration::from_millis(100))
            .unwrap()
            .instances(&addr.ip().to_string(), addr.port())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Request(e) if e.is_timeout()));
    }

    #[test]
    fn ipv6_listener_is_bracketed() {
        assert_eq!(
            ListenerClient::url("fd00::1", 3000, "/instances"),
            "http://[fd00::1]:3000/instances"
        );
        assert_eq!(
            ListenerClient::url("10.0.0.2", 3000, "/instances"),
            "http://10.0.0.2:3000/instances"
        );
    }
}
