use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub debug: bool,
    pub enable_swagger: bool,
    pub auth_service_url: Url,
    pub payment_service_url: Url,
    pub collaborator_timeout_ms: u64,
    pub identity_cache_ttl_secs: u64,
    /// Zero disables the background sweep; reads still sweep on demand.
    pub completion_sweep_interval_secs: u64,
    pub calendar_name: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with APP_ prefix, e.g. APP_AUTH_SERVICE_URL
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("port", 8080)?
            .set_default("debug", false)?
            .set_default("enable_swagger", true)?
            .set_default("auth_service_url", "http://localhost:3001")?
            .set_default("payment_service_url", "http://localhost:3003")?
            .set_default("collaborator_timeout_ms", 5000)?
            .set_default("identity_cache_ttl_secs", 30)?
            .set_default("completion_sweep_interval_secs", 60)?
            .set_default("calendar_name", "Gym class schedule")?
            .build()?;

        config.try_deserialize()
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn identity_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.identity_cache_ttl_secs)
    }

    pub fn completion_sweep_interval(&self) -> Option<Duration> {
        (self.completion_sweep_interval_secs > 0)
            .then(|| Duration::from_secs(self.completion_sweep_interval_secs))
    }
}
