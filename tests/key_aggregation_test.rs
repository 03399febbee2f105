// Integration tests for the aggregating key provider

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{broken_issuer, jwk, jwks_response, mock_issuer, mount_discovery};
use oidc_aggregator::config::HttpKeyProviderConfig;
use oidc_aggregator::issuer::StaticIssuerProvider;
use oidc_aggregator::keys::{HttpKeyProvider, KeyProvider};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

fn provider(issuers: Vec<String>, config: &HttpKeyProviderConfig) -> HttpKeyProvider {
    HttpKeyProvider::new(
        reqwest::Client::new(),
        Arc::new(StaticIssuerProvider::new(issuers)),
        config,
    )
}

fn short_ttl_config() -> HttpKeyProviderConfig {
    HttpKeyProviderConfig {
        max_ttl_seconds: 1,
        default_key_ttl_seconds: 1,
    }
}

#[tokio::test]
async fn test_aggregates_keys_in_issuer_order() {
    let issuer_a = mock_issuer(vec![jwk("k1", "from-a")], None).await;
    let issuer_b = mock_issuer(vec![jwk("k2", "from-b")], None).await;

    let provider = provider(
        vec![issuer_a.uri(), issuer_b.uri()],
        &HttpKeyProviderConfig::default(),
    );

    let kids: Vec<String> = provider
        .key_set()
        .await
        .unwrap()
        .into_iter()
        .map(|key| key.kid)
        .collect();
    assert_eq!(kids, vec!["k1", "k2"]);
}

#[tokio::test]
async fn test_duplicate_kid_first_seen_wins() {
    let issuer_a = mock_issuer(vec![jwk("k1", "from-a")], None).await;
    let issuer_b = mock_issuer(vec![jwk("k1", "from-b")], None).await;

    let provider = provider(
        vec![issuer_a.uri(), issuer_b.uri()],
        &HttpKeyProviderConfig::default(),
    );

    let keys = provider.key_set().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].kid, "k1");
    assert_eq!(keys[0].n.as_deref(), Some("from-a"));
}

#[tokio::test]
async fn test_duplicate_issuer_urls_collapse_to_one_fetch() {
    let issuer = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": issuer.uri(),
            "jwks_uri": format!("{}/jwks", issuer.uri()),
        })))
        .expect(1)
        .mount(&issuer)
        .await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(jwks_response(vec![jwk("k1", "m")], None))
        .expect(1)
        .mount(&issuer)
        .await;

    let provider = provider(
        vec![issuer.uri(), issuer.uri(), issuer.uri()],
        &HttpKeyProviderConfig::default(),
    );

    let keys = provider.key_set().await.unwrap();
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn test_failing_issuer_is_isolated_and_retried() {
    let issuer_a = broken_issuer(500).await;
    let issuer_b = mock_issuer(vec![jwk("k2", "from-b")], None).await;

    let provider = provider(
        vec![issuer_a.uri(), issuer_b.uri()],
        &HttpKeyProviderConfig::default(),
    );

    // the broken issuer contributes nothing but does not fail the call
    let keys = provider.key_set().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].kid, "k2");

    // a failed refresh does not extend the deadline: the next call retries
    let keys = provider.key_set().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(
        issuer_a.received_requests().await.unwrap().len(),
        2,
        "broken issuer should be retried on every aggregated request"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cold_start_fan_in_is_single_flight() {
    let issuer = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "issuer": issuer.uri(),
            "jwks_uri": format!("{}/jwks", issuer.uri()),
        })))
        .expect(1)
        .mount(&issuer)
        .await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(jwks_response(vec![jwk("k1", "m")], Some("max-age=3600")))
        .expect(1)
        .mount(&issuer)
        .await;

    let provider = Arc::new(provider(
        vec![issuer.uri()],
        &HttpKeyProviderConfig::default(),
    ));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let provider = provider.clone();
        handles.push(tokio::spawn(async move { provider.key_set().await.unwrap() }));
    }

    for handle in handles {
        let keys = handle.await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].kid, "k1");
    }
}

#[tokio::test]
async fn test_fresh_cell_is_served_from_cache() {
    let issuer = MockServer::start().await;
    mount_discovery(&issuer).await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(jwks_response(vec![jwk("k1", "m")], Some("max-age=3600")))
        .expect(1)
        .mount(&issuer)
        .await;

    let provider = provider(vec![issuer.uri()], &HttpKeyProviderConfig::default());

    for _ in 0..3 {
        let keys = provider.key_set().await.unwrap();
        assert_eq!(keys.len(), 1);
    }
}

#[tokio::test]
async fn test_rotation_retains_unexpired_keys() {
    let issuer = MockServer::start().await;
    mount_discovery(&issuer).await;

    // first fetch yields k1+k2, every later fetch k2+k3; the advertised key
    // TTL is far above the 1 s refresh bound, so k1 stays serveable across
    // the rotation until its own expiry
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(jwks_response(
            vec![jwk("k1", "m1"), jwk("k2", "m2")],
            Some("max-age=3600"),
        ))
        .up_to_n_times(1)
        .mount(&issuer)
        .await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(jwks_response(
            vec![jwk("k2", "m2"), jwk("k3", "m3")],
            Some("max-age=3600"),
        ))
        .mount(&issuer)
        .await;

    let provider = provider(vec![issuer.uri()], &short_ttl_config());

    let mut kids: Vec<String> = provider
        .key_set()
        .await
        .unwrap()
        .into_iter()
        .map(|key| key.kid)
        .collect();
    kids.sort_unstable();
    assert_eq!(kids, vec!["k1", "k2"]);

    // let the refresh deadline pass
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let mut kids: Vec<String> = provider
        .key_set()
        .await
        .unwrap()
        .into_iter()
        .map(|key| key.kid)
        .collect();
    kids.sort_unstable();
    assert_eq!(kids, vec!["k1", "k2", "k3"]);
}

#[tokio::test]
async fn test_stale_cell_with_dead_upstream_reports_no_keys() {
    let issuer = MockServer::start().await;
    mount_discovery(&issuer).await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(jwks_response(vec![jwk("k1", "m")], Some("max-age=3600")))
        .mount(&issuer)
        .await;

    let provider = provider(vec![issuer.uri()], &short_ttl_config());

    let keys = provider.key_set().await.unwrap();
    assert_eq!(keys.len(), 1);

    // upstream goes away entirely; once the cell is due again the keys are
    // no longer served, but the aggregated call still succeeds
    issuer.reset().await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let keys = provider.key_set().await.unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn test_empty_catalog_yields_empty_set() {
    let provider = provider(Vec::new(), &HttpKeyProviderConfig::default());
    assert!(provider.key_set().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_issuer_introspection_propagates_failure() {
    let issuer = broken_issuer(500).await;
    let provider = provider(vec![issuer.uri()], &HttpKeyProviderConfig::default());

    assert!(provider.issuer_key_set(&issuer.uri()).await.is_err());
}

#[tokio::test]
async fn test_single_issuer_introspection_creates_and_refreshes() {
    let issuer = mock_issuer(vec![jwk("k1", "m")], None).await;
    let provider = provider(Vec::new(), &HttpKeyProviderConfig::default());

    // the issuer does not have to be in the catalog to be inspected
    let keys = provider.issuer_key_set(&issuer.uri()).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].kid, "k1");
}
