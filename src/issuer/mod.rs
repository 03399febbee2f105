// Issuer catalog providers

mod chain;
mod http;
mod static_list;

pub use chain::ChainIssuerProvider;
pub use http::HttpIssuerProvider;
pub use static_list::StaticIssuerProvider;

use async_trait::async_trait;

/// Source of the current set of trusted upstream issuer URLs.
///
/// Invoked once per aggregated key-set request, so implementations must be
/// safe to call at request rate. Catalog failures degrade to an empty list
/// rather than failing the request.
#[async_trait]
pub trait IssuerProvider: Send + Sync {
    async fn issuers(&self) -> Vec<String>;
}
