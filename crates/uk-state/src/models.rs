use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Instance ────────────────────────────────────────────────────────

/// Canonical lifecycle state shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Pending,
    Running,
    Stopped,
    Terminated,
    Unknown,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Platform identifier. For hypervisor-backed instances this is the
    /// identifier the hypervisor assigned when the VM was created.
    pub id: String,
    pub name: String,
    pub state: InstanceState,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Provider that launched the instance, e.g. `"vsphere"`.
    pub provider: String,
    pub image_id: String,
    pub created: DateTime<Utc>,
}

impl Instance {
    /// A freshly launched instance that no reconciliation pass has seen yet.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        image_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: InstanceState::Pending,
            ip_address: None,
            provider: provider.into(),
            image_id: image_id.into(),
            created: Utc::now(),
        }
    }
}
