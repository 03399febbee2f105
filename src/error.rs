// Error types for the aggregator

use thiserror::Error;

use crate::jwks::FetchError;

/// Main error type for the aggregator
#[derive(Debug, Error)]
pub enum Error {
    // Fatal at startup only
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    // Catalog errors (recovered: the catalog degrades to an empty list)
    #[error("issuer catalog unavailable: {0}")]
    IssuerCatalogUnavailable(String),

    // Per-issuer discovery/JWKS errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status code for this error when it surfaces to a client
    pub fn status_code(&self) -> u16 {
        match self {
            Error::ConfigInvalid(_) => 500,
            Error::IssuerCatalogUnavailable(_) => 502,
            Error::Fetch(_) => 500,
            Error::Io(_) => 500,
            Error::Other(_) => 500,
        }
    }
}
