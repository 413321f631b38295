use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Allowed browser origin; any origin when unset.
    pub cors_origin: Option<String>,
    /// Upper bound on a single market data request.
    pub provider_timeout_secs: u64,
    /// Runtime switch for the recurrent model.
    pub sequence_enabled: bool,
    /// Trees in the random forest.
    pub ensemble_trees: usize,
    /// Maximum depth of each forest tree.
    pub ensemble_max_depth: u16,
    /// Window length of the recurrent model.
    pub sequence_lookback: usize,
    /// Hidden units of the recurrent model.
    pub sequence_hidden: usize,
    /// Training epochs of the recurrent model.
    pub sequence_epochs: usize,
    /// Adam step size of the recurrent model.
    pub sequence_learning_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origin: None,
            provider_timeout_secs: 30,
            sequence_enabled: true,
            ensemble_trees: 100,
            ensemble_max_depth: 10,
            sequence_lookback: 60,
            sequence_hidden: 32,
            sequence_epochs: 20,
            sequence_learning_rate: 0.005,
        }
    }
}

/// Parse an env var, keeping `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|o| !o.trim().is_empty()),
            provider_timeout_secs: env_or("PROVIDER_TIMEOUT_SECS", defaults.provider_timeout_secs),
            sequence_enabled: env_flag("SEQUENCE_MODEL_ENABLED", defaults.sequence_enabled),
            ensemble_trees: env_or("ENSEMBLE_TREES", defaults.ensemble_trees).max(1),
            ensemble_max_depth: env_or("ENSEMBLE_MAX_DEPTH", defaults.ensemble_max_depth).max(1),
            sequence_lookback: env_or("SEQUENCE_LOOKBACK", defaults.sequence_lookback).max(1),
            sequence_hidden: env_or("SEQUENCE_HIDDEN", defaults.sequence_hidden).max(1),
            sequence_epochs: env_or("SEQUENCE_EPOCHS", defaults.sequence_epochs).max(1),
            sequence_learning_rate: env_or("SEQUENCE_LEARNING_RATE", defaults.sequence_learning_rate),
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
