// OIDC discovery document

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// The openid-configuration document advertised by the aggregator.
///
/// Static for the lifetime of the process: relying parties compare it
/// byte-for-byte, so it carries no time-varying fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub jwks_uri: String,
    pub id_token_signing_alg_values_supported: Vec<String>,
}

impl DiscoveryDocument {
    pub fn new(issuer: &Url) -> Self {
        Self {
            issuer: issuer.to_string(),
            jwks_uri: jwks_uri(issuer),
            id_token_signing_alg_values_supported: vec!["RS256".to_string()],
        }
    }
}

/// The issuer URL joined with the keys endpoint
fn jwks_uri(issuer: &Url) -> String {
    let mut url = issuer.clone();
    let path = format!("{}/keys", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.to_string()
}
