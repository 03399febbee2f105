// Fixed issuer catalog supplied at construction

use async_trait::async_trait;

use super::IssuerProvider;

/// Issuer catalog backed by a fixed list from configuration
#[derive(Debug, Clone)]
pub struct StaticIssuerProvider {
    issuers: Vec<String>,
}

impl StaticIssuerProvider {
    pub fn new(issuers: Vec<String>) -> Self {
        Self { issuers }
    }
}

#[async_trait]
impl IssuerProvider for StaticIssuerProvider {
    async fn issuers(&self) -> Vec<String> {
        self.issuers.clone()
    }
}
