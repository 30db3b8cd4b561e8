//! Node configuration: everything comes from the environment, with
//! sane defaults for local development.

use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub http_port: u16,
    pub p2p_port: u16,
    pub private_key_location: String,
}

impl Config {
    fn from_env() -> Self {
        Self {
            http_port: parse_env("HTTP_PORT").unwrap_or(3001),
            p2p_port: parse_env("P2P_PORT").unwrap_or(6001),
            private_key_location: env_var("PRIVATE_KEY_LOCATION")
                .unwrap_or_else(|| "node/wallet/private_key".to_string()),
        }
    }

    /// Get or initialize the process-wide configuration.
    pub fn global() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_var(key)?.parse().ok()
}
