use chrono::{DateTime, Utc};
use serde::Serialize;
use uk_state::models::{Instance, InstanceState};

// ── Responses ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct InstanceResponse {
    pub id: String,
    pub name: String,
    pub state: InstanceState,
    pub ip_address: Option<String>,
    pub provider: String,
    pub image_id: String,
    pub created: DateTime<Utc>,
}

impl From<Instance> for InstanceResponse {
    fn from(instance: Instance) -> Self {
        Self {
            id: instance.id,
            name: instance.name,
            state: instance.state,
            ip_address: instance.ip_address,
            provider: instance.provider,
            image_id: instance.image_id,
            created: instance.created,
        }
    }
}
