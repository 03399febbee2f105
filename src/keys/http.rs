// Aggregating key provider: fans out to every trusted issuer's JWKS

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures_util::future;

use super::{push_deduped, KeyProvider};
use crate::config::HttpKeyProviderConfig;
use crate::error::Error;
use crate::issuer::IssuerProvider;
use crate::jwks::{CachedKeySet, FetchError, JsonWebKey};

/// Key provider that aggregates the JWKS of every issuer in the catalog.
///
/// Holds one cache cell per distinct issuer URL; cells are created lazily
/// and never removed. Each aggregated request refreshes due cells
/// concurrently, one fetch per issuer at most (the cell lock coalesces
/// racing refreshes).
pub struct HttpKeyProvider {
    client: reqwest::Client,
    issuer_provider: Arc<dyn IssuerProvider>,
    cached_key_sets: DashMap<String, Arc<CachedKeySet>>,
    default_key_ttl: Duration,
    max_key_ttl: Duration,
}

impl HttpKeyProvider {
    pub fn new(
        client: reqwest::Client,
        issuer_provider: Arc<dyn IssuerProvider>,
        config: &HttpKeyProviderConfig,
    ) -> Self {
        Self {
            client,
            issuer_provider,
            cached_key_sets: DashMap::new(),
            default_key_ttl: config.default_key_ttl(),
            max_key_ttl: config.max_ttl(),
        }
    }

    /// Get-or-create the cache cell for `issuer`.
    ///
    /// The entry API makes the insert atomic: the loser of a creation race
    /// gets the stored cell.
    fn cell(&self, issuer: &str) -> Arc<CachedKeySet> {
        self.cached_key_sets
            .entry(issuer.to_string())
            .or_insert_with(|| {
                tracing::debug!(issuer = %issuer, "creating cache cell");
                Arc::new(CachedKeySet::new(issuer))
            })
            .clone()
    }

    /// Current keys for one issuer, refreshing its cell first when due.
    ///
    /// Fetch failures propagate and leave the cell untouched, so the next
    /// call retries.
    pub async fn issuer_key_set(&self, issuer: &str) -> Result<Vec<JsonWebKey>, FetchError> {
        let cell = self.cell(issuer);

        if cell.should_refresh(Utc::now()).await {
            tracing::info!(issuer = %issuer, "key set due for refresh");
            cell.update(&self.client, self.default_key_ttl, self.max_key_ttl, false)
                .await?;
        }

        Ok(cell.keys().await)
    }

    /// Keys for one issuer with failures degraded to an empty contribution
    async fn issuer_keys_best_effort(&self, issuer: &str) -> Vec<JsonWebKey> {
        tracing::debug!(issuer = %issuer, "lookup issuer");

        match self.issuer_key_set(issuer).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(
                    issuer = %issuer,
                    error = %err,
                    "failed to get key set from issuer, contributing no keys this round"
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl KeyProvider for HttpKeyProvider {
    async fn key_set(&self) -> Result<Vec<JsonWebKey>, Error> {
        let issuers = self.issuer_provider.issuers().await;

        // collapse duplicate URLs within this call; order is preserved so
        // the kid dedup below follows the catalog order
        let mut reached = HashSet::new();
        let mut distinct = Vec::new();
        for issuer in issuers {
            if reached.insert(issuer.clone()) {
                distinct.push(issuer);
            } else {
                tracing::warn!(issuer = %issuer, "issuer already reached, skipping");
            }
        }

        let batches =
            future::join_all(distinct.iter().map(|issuer| self.issuer_keys_best_effort(issuer)))
                .await;

        let mut result = Vec::new();
        let mut seen = HashSet::new();
        for batch in batches {
            push_deduped(&mut result, &mut seen, batch);
        }

        tracing::debug!(issuers = distinct.len(), keys = result.len(), "aggregated key set");
        Ok(result)
    }
}
