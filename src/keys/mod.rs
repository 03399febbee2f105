// Key providers: sources of the aggregated signing-key set

mod chain;
mod http;
mod k8s;

pub use chain::ChainKeyProvider;
pub use http::HttpKeyProvider;
pub use k8s::K8sKeyProvider;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Error;
use crate::jwks::JsonWebKey;

/// A source of signing keys for the aggregated JWKS document
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn key_set(&self) -> Result<Vec<JsonWebKey>, Error>;
}

/// Append `keys` to `result`, dropping any whose `kid` was already seen.
/// First seen wins.
fn push_deduped(result: &mut Vec<JsonWebKey>, seen: &mut HashSet<String>, keys: Vec<JsonWebKey>) {
    for key in keys {
        if seen.insert(key.kid.clone()) {
            result.push(key);
        } else {
            tracing::warn!(kid = %key.kid, "kid already present, skipping duplicate");
        }
    }
}
