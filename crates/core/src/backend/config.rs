//! Configuration for the HTTP inference backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the inference service lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the inference service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single generation request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for a model load, in seconds. Loads can take a long time on
    /// first download of the weights.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_timeout() -> u64 {
    600 // 10 minutes
}

fn default_load_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            load_timeout_secs: default_load_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8765");
        assert_eq!(config.timeout(), Duration::from_secs(600));
        assert_eq!(config.load_timeout(), Duration::from_secs(1800));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: BackendConfig = toml::from_str(r#"base_url = "http://gpu-box:9000""#).unwrap();
        assert_eq!(config.base_url, "http://gpu-box:9000");
        assert_eq!(config.timeout_secs, 600);
    }
}
