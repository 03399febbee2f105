// Remote issuer catalog behind an HTTP endpoint

use async_trait::async_trait;
use serde_json::Value;

use super::IssuerProvider;
use crate::config::HttpIssuerProviderConfig;
use crate::error::Error;

/// Issuer catalog queried from a remote JSON endpoint.
///
/// Each call issues one GET and extracts a string array with a dot-path
/// query. Any failure is swallowed: an unreachable catalog must not take
/// down the aggregated key-set endpoint.
pub struct HttpIssuerProvider {
    client: reqwest::Client,
    endpoint: String,
    query: String,
}

impl HttpIssuerProvider {
    pub fn new(client: reqwest::Client, config: &HttpIssuerProviderConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            query: config.query.clone(),
        }
    }

    async fn query_issuers(&self) -> Result<Vec<String>, Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|err| Error::IssuerCatalogUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::IssuerCatalogUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|err| Error::IssuerCatalogUnavailable(err.to_string()))?;

        Ok(extract_issuers(&body, &self.query))
    }
}

#[async_trait]
impl IssuerProvider for HttpIssuerProvider {
    async fn issuers(&self) -> Vec<String> {
        match self.query_issuers().await {
            Ok(issuers) => {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    count = issuers.len(),
                    "issuer catalog queried"
                );
                issuers
            }
            Err(err) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %err,
                    "issuer catalog unavailable, treating as empty"
                );
                Vec::new()
            }
        }
    }
}

/// Extract the strings addressed by a dot-path query.
///
/// Path segments descend through objects; arrays met along the way are
/// mapped over and flattened. A path that resolves to nothing yields an
/// empty list. Non-string leaves are ignored.
fn extract_issuers(body: &Value, query: &str) -> Vec<String> {
    fn collect(value: &Value, segments: &[&str], out: &mut Vec<String>) {
        match segments.split_first() {
            None => match value {
                Value::String(s) => out.push(s.clone()),
                Value::Array(items) => {
                    for item in items {
                        if let Value::String(s) = item {
                            out.push(s.clone());
                        }
                    }
                }
                _ => {}
            },
            Some((head, rest)) => match value {
                Value::Object(map) => {
                    if let Some(next) = map.get(*head) {
                        collect(next, rest, out);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        collect(item, segments, out);
                    }
                }
                _ => {}
            },
        }
    }

    let segments: Vec<&str> = query.split('.').filter(|s| !s.is_empty()).collect();
    let mut out = Vec::new();
    collect(body, &segments, &mut out);
    out
}
