// Ordered concatenation of issuer catalogs

use std::sync::Arc;

use async_trait::async_trait;

use super::IssuerProvider;

/// Issuer catalog that concatenates the outputs of an ordered provider list.
///
/// Order is preserved and duplicates are NOT removed here; the key provider
/// collapses duplicate URLs and deduplicates keys by `kid`.
pub struct ChainIssuerProvider {
    providers: Vec<Arc<dyn IssuerProvider>>,
}

impl ChainIssuerProvider {
    pub fn new(providers: Vec<Arc<dyn IssuerProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl IssuerProvider for ChainIssuerProvider {
    async fn issuers(&self) -> Vec<String> {
        let mut issuers = Vec::new();
        for provider in &self.providers {
            issuers.extend(provider.issuers().await);
        }
        issuers
    }
}
