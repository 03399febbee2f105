// Provider configuration sections

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Issuer catalog configuration: which providers participate, in order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssuerProviderConfig {
    /// Fixed list of trusted issuers
    #[serde(default, rename = "static")]
    pub static_: StaticIssuerProviderConfig,

    /// Remote issuer catalog, enabled when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpIssuerProviderConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticIssuerProviderConfig {
    #[serde(default)]
    pub issuers: Vec<String>,
}

/// Remote issuer catalog endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpIssuerProviderConfig {
    /// Catalog endpoint returning a JSON document
    pub endpoint: String,

    /// Dot-path of the string array holding issuer URLs
    #[serde(rename = "gjsonQuery")]
    pub query: String,
}

/// Key provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyProviderConfig {
    #[serde(default)]
    pub http: HttpKeyProviderConfig,

    /// Marker section enabling the in-cluster provider (`k8s: {}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s: Option<K8sKeyProviderConfig>,
}

/// TTL bounds for the aggregating key provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpKeyProviderConfig {
    /// Upper bound on any upstream-supplied key TTL, in seconds
    #[serde(default = "default_max_ttl_seconds", rename = "maxTTLSeconds")]
    pub max_ttl_seconds: u64,

    /// TTL used when an upstream supplies no usable Cache-Control, in seconds
    #[serde(default = "default_key_ttl_seconds", rename = "defaultKeyTTLSeconds")]
    pub default_key_ttl_seconds: u64,
}

impl Default for HttpKeyProviderConfig {
    fn default() -> Self {
        Self {
            max_ttl_seconds: default_max_ttl_seconds(),
            default_key_ttl_seconds: default_key_ttl_seconds(),
        }
    }
}

impl HttpKeyProviderConfig {
    /// Upper TTL bound as a Duration
    pub fn max_ttl(&self) -> Duration {
        Duration::from_secs(self.max_ttl_seconds)
    }

    /// Fallback TTL as a Duration
    pub fn default_key_ttl(&self) -> Duration {
        Duration::from_secs(self.default_key_ttl_seconds)
    }
}

/// Marker for the in-cluster provider; carries no options today
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct K8sKeyProviderConfig {}

fn default_max_ttl_seconds() -> u64 {
    300
}

fn default_key_ttl_seconds() -> u64 {
    120
}
