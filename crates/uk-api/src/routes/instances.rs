use axum::Json;
use axum::extract::{Path, State};
use uk_infra::ProviderRegistry;
use uk_state::models::Instance;

use crate::dto::InstanceResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Run one reconciliation pass per provider, one provider at a time.
async fn reconcile_all(providers: &ProviderRegistry) -> Result<Vec<Instance>, ApiError> {
    let mut all = Vec::new();
    for provider in providers.providers() {
        let instances = provider.list_instances().await?;
        tracing::debug!(provider = %provider.name(), instances = instances.len(), "listed instances");
        all.extend(instances);
    }
    Ok(all)
}

pub async fn list_instances(
    State(state): State<AppState>,
) -> Result<Json<Vec<InstanceResponse>>, ApiError> {
    let instances = reconcile_all(&state.providers).await?;
    Ok(Json(instances.into_iter().map(InstanceResponse::from).collect()))
}

pub async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InstanceResponse>, ApiError> {
    reconcile_all(&state.providers)
        .await?
        .into_iter()
        .find(|instance| instance.id == id)
        .map(|instance| Json(InstanceResponse::from(instance)))
        .ok_or(ApiError::NotFound)
}
