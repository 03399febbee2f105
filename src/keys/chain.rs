// Ordered chain of key providers

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::{push_deduped, KeyProvider};
use crate::error::Error;
use crate::jwks::JsonWebKey;

/// Key provider calling its ordered children in turn.
///
/// A failing child is logged and skipped so one broken provider cannot take
/// out the whole key set. Keys are deduplicated by `kid`, first seen wins.
pub struct ChainKeyProvider {
    providers: Vec<Arc<dyn KeyProvider>>,
}

impl ChainKeyProvider {
    pub fn new(providers: Vec<Arc<dyn KeyProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl KeyProvider for ChainKeyProvider {
    async fn key_set(&self) -> Result<Vec<JsonWebKey>, Error> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();

        for provider in &self.providers {
            match provider.key_set().await {
                Ok(keys) => push_deduped(&mut result, &mut seen, keys),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "key provider failed, continuing with remaining providers"
                    );
                }
            }
        }

        Ok(result)
    }
}
