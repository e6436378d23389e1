//! Process configuration, layered from defaults, an optional TOML file,
//! `EEG_PREDICT_*` environment variables and finally a bare `PORT`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_VAR: &str = "EEG_PREDICT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "eeg-predict.toml";
const ENV_PREFIX: &str = "EEG_PREDICT_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub bind_address: IpAddr,
    pub port: u16,
    /// JSON model manifest loaded at start-up.
    pub model_path: PathBuf,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            model_path: PathBuf::from("model.json"),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when a layer holds a value of the wrong type or an
    /// unknown key.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
            .merge(Env::raw().only(&["port"]))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
