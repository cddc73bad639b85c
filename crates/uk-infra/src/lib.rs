pub mod listener;
pub mod retry;
pub mod vsphere;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uk_state::LocalState;
use uk_state::models::Instance;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("getting vsphere vms: {0}")]
    ListVms(#[source] BoxError),

    #[error("failed to retrieve instance listener ip, is the instance listener running? {0}")]
    ListenerIp(#[source] BoxError),

    #[error("failed to retrieve instance ip for mac {mac} after {attempts} attempts: {source}")]
    InstanceIp {
        mac: String,
        attempts: u32,
        source: BoxError,
    },

    #[error("saving instance to state: {0}")]
    SaveState(#[source] uk_state::Error),

    #[error("vsphere api error: {0}")]
    Vsphere(#[from] vsphere_api::Error),

    #[error("instance listener client: {0}")]
    Listener(#[from] listener_api::Error),

    #[error("missing env var: {0}")]
    MissingEnv(String),

    #[error("invalid env var {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Known hypervisor provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Vsphere,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vsphere => "vsphere",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vsphere" => Ok(Self::Vsphere),
            other => Err(Error::UnknownProvider(other.to_string())),
        }
    }
}

/// Backend-agnostic view of the instances a hypervisor is running.
///
/// Each provider owns its own configuration, loaded from environment
/// variables at construction, and shares the platform instance store.
#[async_trait]
pub trait InstanceProvider: Send + Sync + 'static {
    /// Run one reconciliation pass: enumerate the backend's VMs, refresh the
    /// matching store records, and return every record that was refreshed.
    ///
    /// Either every reconciled instance is returned or the pass fails as a
    /// whole; records already persisted by a failed pass stay persisted.
    async fn list_instances(&self) -> Result<Vec<Instance>>;

    /// Provider identifier.
    fn name(&self) -> ProviderName;
}

/// Registry of all configured providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, Arc<dyn InstanceProvider>>,
}

impl ProviderRegistry {
    /// Register `provider` under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn InstanceProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    /// Look up a provider by name.
    pub fn get(&self, name: ProviderName) -> Option<&Arc<dyn InstanceProvider>> {
        self.providers.get(&name)
    }

    /// All providers, in name order.
    pub fn providers(&self) -> Vec<&Arc<dyn InstanceProvider>> {
        let mut providers: Vec<_> = self.providers.values().collect();
        providers.sort_by_key(|p| p.name().as_str());
        providers
    }

    /// List the names of all available providers.
    pub fn available(&self) -> Vec<ProviderName> {
        self.providers.keys().copied().collect()
    }

    /// Returns `true` if no provider is configured.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Build all providers whose required env vars are present.
///
/// Providers with missing configuration are skipped with a debug log; any
/// other construction failure is logged as a warning. Returns an error only
/// if no provider could be constructed at all.
pub async fn build_providers(state: Arc<LocalState>) -> Result<ProviderRegistry> {
    dotenvy::dotenv().ok();

    let mut registry = ProviderRegistry::default();

    match vsphere::VsphereProvider::from_env(state).await {
        Ok(p) => {
            tracing::info!("registered vSphere provider");
            registry.register(Arc::new(p));
        }
        Err(e @ Error::MissingEnv(_)) => tracing::debug!("skipping vSphere provider: {e}"),
        Err(e) => tracing::warn!(error = %e, "skipping vSphere provider"),
    }

    if registry.is_empty() {
        return Err(Error::MissingEnv(
            "no providers configured (set VSPHERE_URL, VSPHERE_USER and VSPHERE_PASSWORD)".into(),
        ));
    }

    Ok(registry)
}
