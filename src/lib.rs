// OIDC discovery aggregator library

pub mod cli;
pub mod config;
pub mod error;
pub mod issuer;
pub mod jwks;
pub mod keys;
pub mod server;

// Re-export commonly used types
pub use error::{Error, Result};
