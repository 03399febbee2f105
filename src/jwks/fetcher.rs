// OIDC discovery and JWKS retrieval for a single upstream issuer

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::jwks::key::JsonWebKey;

const OIDC_DOCUMENT_PATH: &str = "/.well-known/openid-configuration";

/// Errors from the two-step discovery + JWKS fetch
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("OIDC discovery failed for issuer {issuer}: {reason}")]
    DiscoveryFailed { issuer: String, reason: String },

    #[error("JWKS fetch failed for issuer {issuer}: {reason}")]
    JwksFetchFailed { issuer: String, reason: String },
}

/// A freshly fetched key batch and the refresh TTL chosen for it.
///
/// Each key carries its own `expires_at` derived from the upstream TTL
/// before clamping; `refresh_ttl` is the clamped value that schedules the
/// next fetch. An upstream advertising a TTL above the operator bound is
/// re-checked at the bound while its keys stay valid to their advertised
/// expiry, which is what keeps keys serveable across a rotation.
#[derive(Debug)]
pub struct FetchedKeys {
    pub keys: Vec<JsonWebKey>,
    pub refresh_ttl: Duration,
}

/// OIDC discovery document, reduced to the field the fetch needs
#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    jwks_uri: String,
}

/// Fetch the current signing keys of `issuer`.
///
/// Performs OIDC discovery to find `jwks_uri`, fetches the key set, and
/// derives TTLs from the JWKS response's `Cache-Control` header: absent,
/// unparseable, or `no-cache` headers fall back to `default_ttl`, and the
/// refresh TTL is clamped to `max_ttl`.
pub async fn fetch_issuer_keys(
    client: &reqwest::Client,
    issuer: &str,
    default_ttl: Duration,
    max_ttl: Duration,
) -> Result<FetchedKeys, FetchError> {
    let document_url = format!("{}{}", issuer.trim_end_matches('/'), OIDC_DOCUMENT_PATH);
    tracing::debug!(issuer = %issuer, url = %document_url, "fetching OIDC document");

    let response = client
        .get(&document_url)
        .send()
        .await
        .map_err(|err| FetchError::DiscoveryFailed {
            issuer: issuer.to_string(),
            reason: err.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(FetchError::DiscoveryFailed {
            issuer: issuer.to_string(),
            reason: format!("HTTP {} from {}", response.status(), document_url),
        });
    }

    let document: DiscoveryResponse =
        response
            .json()
            .await
            .map_err(|err| FetchError::DiscoveryFailed {
                issuer: issuer.to_string(),
                reason: err.to_string(),
            })?;

    if document.jwks_uri.is_empty() {
        return Err(FetchError::DiscoveryFailed {
            issuer: issuer.to_string(),
            reason: "discovery document has an empty jwks_uri".to_string(),
        });
    }

    tracing::info!(issuer = %issuer, jwks_uri = %document.jwks_uri, "fetching JWKS");

    let response = client
        .get(&document.jwks_uri)
        .send()
        .await
        .map_err(|err| FetchError::JwksFetchFailed {
            issuer: issuer.to_string(),
            reason: err.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(FetchError::JwksFetchFailed {
            issuer: issuer.to_string(),
            reason: format!("HTTP {} from {}", response.status(), document.jwks_uri),
        });
    }

    let cache_control = response
        .headers()
        .get(reqwest::header::CACHE_CONTROL)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let body = response
        .bytes()
        .await
        .map_err(|err| FetchError::JwksFetchFailed {
            issuer: issuer.to_string(),
            reason: err.to_string(),
        })?;

    let (key_ttl, refresh_ttl) = derive_ttls(cache_control.as_deref(), default_ttl, max_ttl);
    let expires_at = expiry_after(Utc::now(), key_ttl);

    let keys = parse_jwks(&body, expires_at).map_err(|err| FetchError::JwksFetchFailed {
        issuer: issuer.to_string(),
        reason: err.to_string(),
    })?;

    Ok(FetchedKeys { keys, refresh_ttl })
}

/// JWKS envelope with elements kept raw so one bad key cannot fail the batch
#[derive(Debug, Deserialize)]
struct RawKeySet {
    keys: Vec<serde_json::Value>,
}

/// Parse a JWKS document, skipping elements that fail to decode.
///
/// Upstreams sometimes publish experimental key types; partial success is
/// preferred over total failure. Errors only when the outer envelope is
/// unreadable.
pub(crate) fn parse_jwks(
    body: &[u8],
    expires_at: DateTime<Utc>,
) -> Result<Vec<JsonWebKey>, serde_json::Error> {
    let raw: RawKeySet = serde_json::from_slice(body)?;

    let mut keys = Vec::with_capacity(raw.keys.len());
    for value in raw.keys {
        match serde_json::from_value::<JsonWebKey>(value) {
            Ok(mut key) => {
                key.expires_at = expires_at;
                keys.push(key);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to decode JWK, skipping");
            }
        }
    }

    Ok(keys)
}

/// `now + ttl`, saturating at the calendar's end
pub(crate) fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The (per-key, refresh) TTL pair for a JWKS response.
///
/// The per-key TTL is taken from `max-age` as advertised, falling back to
/// `default_ttl`; the refresh TTL is the same value clamped to `max_ttl`.
fn derive_ttls(
    cache_control: Option<&str>,
    default_ttl: Duration,
    max_ttl: Duration,
) -> (Duration, Duration) {
    let key_ttl = cache_control
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(default_ttl);

    (key_ttl, key_ttl.min(max_ttl))
}

/// `max-age` seconds from a `Cache-Control` value; `None` when the directive
/// is absent, unparseable, or `no-cache` is present
fn parse_cache_control_max_age(cache_control: &str) -> Option<u64> {
    let mut max_age = None;

    for directive in cache_control.split(',') {
        let directive = directive.trim().to_ascii_lowercase();
        if directive == "no-cache" {
            return None;
        }
        if let Some(value) = directive.strip_prefix("max-age=") {
            if let Ok(seconds) = value.parse::<u64>() {
                max_age = Some(seconds);
            }
        }
    }

    max_age
}
