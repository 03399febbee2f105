// JWKS handling: key types, the per-issuer fetch, and the cache cell

pub mod cache;
pub mod fetcher;
pub mod key;

pub use cache::CachedKeySet;
pub use fetcher::{fetch_issuer_keys, FetchError, FetchedKeys};
pub use key::{JsonWebKey, JsonWebKeySet};
