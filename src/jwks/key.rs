// JSON Web Key data structures
// Key material is carried verbatim as base64url strings; the aggregator
// republishes keys and never decodes them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON Web Key Set structure
/// Per RFC 7517: https://tools.ietf.org/html/rfc7517
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Find a key by its key ID (kid)
    pub fn find_key(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// One JSON Web Key plus a locally assigned expiry instant.
///
/// `kid` is the identity: two keys with the same `kid` from the same issuer
/// are the same key, and the newer fetch wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key ID
    pub kid: String,

    /// Key type (RSA, EC, oct, OKP)
    pub kty: String,

    /// Algorithm (RS256, RS384, ES256, ...)
    pub alg: String,

    /// Public key use (sig for signature, enc for encryption)
    #[serde(rename = "use")]
    pub use_: String,

    /// RSA modulus (base64url encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// EC curve (P-256, P-384, P-521)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// EC x coordinate (base64url encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC y coordinate (base64url encoded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Additional fields, carried through untouched
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,

    /// Wall-clock instant after which this key is no longer served.
    /// Assigned locally at fetch time; never part of the JWK wire form.
    #[serde(skip_serializing, skip_deserializing, default = "unix_epoch")]
    pub expires_at: DateTime<Utc>,
}

impl JsonWebKey {
    /// Whether the key's local TTL has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}
