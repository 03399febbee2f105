#![allow(dead_code)]

// Shared helpers for integration tests: mock upstream OIDC issuers

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One RS256 JWK; `n` lets tests tell which issuer a key came from
pub fn jwk(kid: &str, n: &str) -> Value {
    json!({
        "kid": kid,
        "kty": "RSA",
        "alg": "RS256",
        "use": "sig",
        "n": n,
        "e": "AQAB"
    })
}

/// Mount the OIDC discovery document pointing at the server's /jwks path
pub async fn mount_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": server.uri(),
            "jwks_uri": format!("{}/jwks", server.uri()),
        })))
        .mount(server)
        .await;
}

/// JWKS response template for the given keys
pub fn jwks_response(keys: Vec<Value>, cache_control: Option<&str>) -> ResponseTemplate {
    let mut template = ResponseTemplate::new(200).set_body_json(json!({ "keys": keys }));
    if let Some(header) = cache_control {
        template = template.insert_header("Cache-Control", header);
    }
    template
}

/// Mock upstream issuer serving discovery and a fixed JWKS
pub async fn mock_issuer(keys: Vec<Value>, cache_control: Option<&str>) -> MockServer {
    let server = MockServer::start().await;
    mount_discovery(&server).await;

    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(jwks_response(keys, cache_control))
        .mount(&server)
        .await;

    server
}

/// Mock issuer whose discovery endpoint always fails
pub async fn broken_issuer(status: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    server
}
