use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub api_key: String,
    pub state_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".into())
                .parse()
                .expect("LISTEN_ADDR must be a valid socket address"),
            api_key: env::var("UNIK_API_KEY").expect("UNIK_API_KEY must be set"),
            state_file: env::var("UNIK_STATE_FILE")
                .unwrap_or_else(|_| "./state.json".into())
                .into(),
        }
    }
}
