// Configuration: YAML file plus CLI overrides, read once at startup

pub mod providers;

pub use providers::{
    HttpIssuerProviderConfig, HttpKeyProviderConfig, IssuerProviderConfig, K8sKeyProviderConfig,
    KeyProviderConfig, StaticIssuerProviderConfig,
};

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Issuer URL advertised in the discovery document
    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default)]
    pub issuer_provider: IssuerProviderConfig,

    #[serde(default)]
    pub key_provider: KeyProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            issuer: default_issuer(),
            issuer_provider: IssuerProviderConfig::default(),
            key_provider: KeyProviderConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or defaults when none is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|err| {
                    Error::ConfigInvalid(format!("failed to read {}: {err}", path.display()))
                })?;
                serde_yaml::from_str(&raw).map_err(|err| {
                    Error::ConfigInvalid(format!("failed to parse {}: {err}", path.display()))
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Fold CLI arguments into the configuration
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(issuer) = &cli.issuer {
            self.issuer = issuer.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        self.issuer_provider
            .static_
            .issuers
            .extend(cli.issuers.iter().cloned());
    }

    /// Parsed issuer URL; invalid URLs are fatal at startup
    pub fn issuer_url(&self) -> Result<Url> {
        Url::parse(&self.issuer)
            .map_err(|err| Error::ConfigInvalid(format!("issuer is not a valid URL: {err}")))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Worker threads (0 = number of CPUs)
    #[serde(default)]
    pub workers: usize,

    /// Timeout for upstream discovery and JWKS requests, in seconds
    #[serde(default = "default_upstream_timeout_seconds")]
    pub upstream_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            upstream_timeout_seconds: default_upstream_timeout_seconds(),
        }
    }
}

impl ServerConfig {
    /// Resolved worker count
    pub fn workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    /// Upstream request timeout as a Duration
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }
}

fn default_issuer() -> String {
    "https://localhost:8080/".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_upstream_timeout_seconds() -> u64 {
    10
}
