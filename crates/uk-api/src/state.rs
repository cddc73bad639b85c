use uk_infra::ProviderRegistry;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub providers: ProviderRegistry,
    pub config: AppConfig,
}
