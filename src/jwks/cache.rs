// Per-issuer JWKS cache cell

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::jwks::fetcher::{self, FetchError};
use crate::jwks::key::JsonWebKey;

/// One cache cell per upstream issuer.
///
/// All reads and writes go through the cell's mutex; `update` holds it
/// across the network round-trip, so concurrent refreshes of the same issuer
/// coalesce into a single fetch.
#[derive(Debug)]
pub struct CachedKeySet {
    issuer: String,
    state: Mutex<CacheState>,
}

#[derive(Debug)]
struct CacheState {
    keys: HashMap<String, JsonWebKey>,
    next_refresh: DateTime<Utc>,
}

impl CachedKeySet {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            state: Mutex::new(CacheState {
                keys: HashMap::new(),
                // epoch start: the first reference always refreshes
                next_refresh: DateTime::<Utc>::UNIX_EPOCH,
            }),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Snapshot of the currently served keys.
    ///
    /// A cell past its refresh deadline reports no keys until a refresh
    /// succeeds; keys past their own expiry are filtered out.
    pub async fn keys(&self) -> Vec<JsonWebKey> {
        let now = Utc::now();
        let state = self.state.lock().await;

        if now > state.next_refresh {
            return Vec::new();
        }

        state
            .keys
            .values()
            .filter(|key| !key.is_expired(now))
            .cloned()
            .collect()
    }

    /// Whether the refresh deadline has passed
    pub async fn should_refresh(&self, now: DateTime<Utc>) -> bool {
        now > self.state.lock().await.next_refresh
    }

    /// Refresh this cell from its issuer.
    ///
    /// Callers that lose the race block on the lock, find the deadline
    /// already pushed forward, and return without a second fetch. On fetch
    /// failure the held keys and the deadline are left untouched, so the
    /// next request retries naturally.
    pub async fn update(
        &self,
        client: &reqwest::Client,
        default_ttl: Duration,
        max_ttl: Duration,
        force: bool,
    ) -> Result<(), FetchError> {
        let mut state = self.state.lock().await;

        if force {
            tracing::debug!(issuer = %self.issuer, "force updating key set");
        } else if Utc::now() <= state.next_refresh {
            // somehow it's already updated, probably by another caller
            tracing::debug!(issuer = %self.issuer, "key set is not due for refresh, skipping update");
            return Ok(());
        }

        let fetched =
            fetcher::fetch_issuer_keys(client, &self.issuer, default_ttl, max_ttl).await?;

        let now = Utc::now();
        reconcile(&mut state.keys, fetched.keys, now);

        // the deadline only ever moves forward
        state.next_refresh = state
            .next_refresh
            .max(fetcher::expiry_after(now, fetched.refresh_ttl));

        tracing::debug!(
            issuer = %self.issuer,
            next_refresh = %state.next_refresh,
            keys = state.keys.len(),
            "key set updated"
        );

        Ok(())
    }
}

/// Reconcile held keys with a freshly fetched batch.
///
/// Keys past their own expiry are dropped even when the fetch no longer
/// mentions them; fetched keys are upserted by `kid`; unexpired keys absent
/// from the fetch are retained until their expiry, which gives a grace
/// window when an upstream removes a key mid-rotation.
fn reconcile(keys: &mut HashMap<String, JsonWebKey>, fetched: Vec<JsonWebKey>, now: DateTime<Utc>) {
    keys.retain(|kid, key| {
        if key.is_expired(now) {
            tracing::info!(kid = %kid, expires_at = %key.expires_at, "removing expired key");
            false
        } else {
            true
        }
    });

    for key in fetched {
        if keys.contains_key(&key.kid) {
            tracing::info!(kid = %key.kid, expires_at = %key.expires_at, "updating existing key");
        } else {
            tracing::info!(kid = %key.kid, expires_at = %key.expires_at, "adding new key");
        }
        keys.insert(key.kid.clone(), key);
    }
}
