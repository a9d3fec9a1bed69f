use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::backend::BackendConfig;
use crate::decoder::DecoderConfig;
use crate::library::LibraryConfig;
use crate::settings::Settings;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    /// Captioning settings in effect at startup.
    #[serde(default)]
    pub settings: Settings,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}
