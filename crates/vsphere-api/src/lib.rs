//! Typed Rust client for a vSphere-style management API.
//!
//! Covers the subset a provider needs for instance discovery:
//! session login, VM enumeration (with hardware devices), and guest IP lookup.

mod types;

pub use types::*;

const SESSION_HEADER: &str = "vmware-api-session-id";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vsphere api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vsphere api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("vm {0} has no guest ip address")]
    NoGuestIp(String),

    #[error("invalid vsphere url: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the management REST API, bound to one authenticated session.
#[derive(Clone)]
pub struct VsphereClient {
    base_url: String,
    session: String,
    http: reqwest::Client,
}

impl VsphereClient {
    /// Build a client around an existing session token.
    pub fn new(base_url: impl Into<String>, session: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session: session.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Open a session with basic credentials and return a client bound to it.
    pub async fn login(
        base_url: impl Into<String>,
        user: &str,
        password: &str,
    ) -> Result<Self> {
        let mut client = Self::new(base_url, String::new());

        let resp = client
            .http
            .post(client.url("/api/session"))
            .basic_auth(user, Some(password))
            .send()
            .await?;

        client.session = Self::check(resp, "create session")
            .await?
            .json::<String>()
            .await?;

        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// URL under `/api/vms/<vm_name>/`, with every segment percent-encoded so
    /// inventory names containing `/`, `?` or `#` stay a single segment.
    fn vm_url(&self, vm_name: &str, rest: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "vms", vm_name])
            .extend(rest);
        Ok(url)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    // ── Virtual machines ─────────────────────────────────────────────

    /// List every VM visible to the session, in inventory order.
    pub async fn list_vms(&self) -> Result<Vec<VirtualMachine>> {
        let resp = self
            .http
            .get(self.url("/api/vms"))
            .header(SESSION_HEADER, &self.session)
            .send()
            .await?;

        Self::check(resp, "list vms")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn get_guest_identity(&self, vm_name: &str) -> Result<GuestIdentity> {
        let resp = self
            .http
            .get(self.vm_url(vm_name, &["guest", "identity"])?)
            .header(SESSION_HEADER, &self.session)
            .send()
            .await?;

        Self::check(resp, "get guest identity")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    /// IP address reported by the guest tools of the named VM.
    pub async fn get_vm_ip(&self, vm_name: &str) -> Result<String> {
        self.get_guest_identity(vm_name)
            .await?
            .ip_address
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| Error::NoGuestIp(vm_name.to_string()))
    }
}
