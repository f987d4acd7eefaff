use config::{ConfigError, Environment};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub gateway: GatewaySettings,
    pub ticketing: TicketingSettings,
    pub secret: SecretSetting,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public base URL of this service, used for the gateway's back URLs
    /// and the per-event notification URL.
    pub public_base_url: String,
}

/// Retry policy for outbound gateway calls. Attempts are spaced with a
/// doubling backoff starting at `base_delay_ms`.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry: RetrySettings,
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TicketingSettings {
    pub base_url: String,
    /// Public base URL of the host's presale pages, used to build the
    /// browser redirects after a payment return.
    pub presale_base_url: String,
    pub service_token: SecretString,
    pub timeout_ms: u64,
}

impl TicketingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSetting {
    /// Bearer token the host platform must present on host-facing scopes.
    pub service_token: SecretString,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("configuration.yaml"),
        ))
        .add_source(Environment::default().separator("__"))
        .build()?;
    builder.try_deserialize::<Settings>()
}
