// In-cluster key provider: serves the hosting cluster's own JWKS

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::KeyProvider;
use crate::error::Error;
use crate::jwks::fetcher;
use crate::jwks::{FetchError, JsonWebKey};

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const JWKS_PATH: &str = "/openid/v1/jwks";
const KEY_TTL: Duration = Duration::from_secs(60);

/// Key provider reading the JWKS published by the Kubernetes API server the
/// process runs in. The key set is cached wholesale behind a fixed TTL.
pub struct K8sKeyProvider {
    client: reqwest::Client,
    jwks_url: String,
    token: String,
    state: Mutex<K8sState>,
}

struct K8sState {
    keys: Vec<JsonWebKey>,
    expires: DateTime<Utc>,
}

impl K8sKeyProvider {
    /// Build a provider from the in-cluster service-account environment.
    /// Fails outside a cluster (missing env or mounted credentials).
    pub fn from_cluster_env() -> Result<Self, Error> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            Error::ConfigInvalid(
                "KUBERNETES_SERVICE_HOST is not set; not running in a cluster".to_string(),
            )
        })?;
        let port =
            std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

        let token = std::fs::read_to_string(format!("{SERVICE_ACCOUNT_DIR}/token"))
            .map_err(|err| {
                Error::ConfigInvalid(format!("failed to read service account token: {err}"))
            })?
            .trim()
            .to_string();

        let ca = std::fs::read(format!("{SERVICE_ACCOUNT_DIR}/ca.crt")).map_err(|err| {
            Error::ConfigInvalid(format!("failed to read cluster CA certificate: {err}"))
        })?;
        let certificate = reqwest::Certificate::from_pem(&ca).map_err(|err| {
            Error::ConfigInvalid(format!("cluster CA certificate is not valid PEM: {err}"))
        })?;

        let client = reqwest::Client::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| {
                Error::ConfigInvalid(format!("failed to build in-cluster HTTP client: {err}"))
            })?;

        Ok(Self {
            client,
            jwks_url: format!("https://{host}:{port}{JWKS_PATH}"),
            token,
            state: Mutex::new(K8sState {
                keys: Vec::new(),
                expires: DateTime::<Utc>::UNIX_EPOCH,
            }),
        })
    }

    async fn fetch_cluster_jwks(&self) -> Result<Vec<JsonWebKey>, FetchError> {
        tracing::info!(url = %self.jwks_url, "fetching JWKS from the cluster API server");

        let response = self
            .client
            .get(&self.jwks_url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| FetchError::JwksFetchFailed {
                issuer: self.jwks_url.clone(),
                reason: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::JwksFetchFailed {
                issuer: self.jwks_url.clone(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::JwksFetchFailed {
                issuer: self.jwks_url.clone(),
                reason: err.to_string(),
            })?;

        fetcher::parse_jwks(&body, fetcher::expiry_after(Utc::now(), KEY_TTL)).map_err(|err| {
            FetchError::JwksFetchFailed {
                issuer: self.jwks_url.clone(),
                reason: err.to_string(),
            }
        })
    }
}

#[async_trait]
impl KeyProvider for K8sKeyProvider {
    async fn key_set(&self) -> Result<Vec<JsonWebKey>, Error> {
        let mut state = self.state.lock().await;

        let now = Utc::now();
        if now > state.expires {
            let keys = self.fetch_cluster_jwks().await?;
            state.keys = keys;
            state.expires = fetcher::expiry_after(now, KEY_TTL);
        }

        Ok(state.keys.clone())
    }
}
