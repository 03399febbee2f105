// HTTP server: discovery document, aggregated JWKS, per-issuer introspection

use std::sync::Arc;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::issuer::{ChainIssuerProvider, HttpIssuerProvider, IssuerProvider, StaticIssuerProvider};
use crate::jwks::JsonWebKeySet;
use crate::keys::{ChainKeyProvider, HttpKeyProvider, K8sKeyProvider, KeyProvider};
use crate::server::discovery::DiscoveryDocument;

/// Shared handler state
pub struct AppState {
    /// Pre-serialized discovery document; byte-identical across calls
    discovery_json: String,
    /// Top-level provider behind the aggregated keys endpoint
    key_provider: Arc<dyn KeyProvider>,
    /// The aggregating provider, kept separately for per-issuer introspection
    http_key_provider: Arc<HttpKeyProvider>,
}

impl AppState {
    pub fn new(
        discovery_json: String,
        key_provider: Arc<dyn KeyProvider>,
        http_key_provider: Arc<HttpKeyProvider>,
    ) -> Self {
        Self {
            discovery_json,
            key_provider,
            http_key_provider,
        }
    }
}

/// HTTP server instance
pub struct Server {
    config: Config,
    issuer_path: String,
    state: web::Data<AppState>,
}

impl Server {
    /// Wire up providers from configuration and build the server.
    ///
    /// Fails on an invalid issuer URL or, when the in-cluster provider is
    /// enabled, outside a cluster.
    pub fn new(config: Config) -> Result<Self> {
        let issuer_url = config.issuer_url()?;

        let client = reqwest::Client::builder()
            .timeout(config.server.upstream_timeout())
            .build()
            .map_err(|err| Error::ConfigInvalid(format!("failed to build HTTP client: {err}")))?;

        // issuer catalog: static entries first, then the remote catalog
        let mut issuer_providers: Vec<Arc<dyn IssuerProvider>> =
            vec![Arc::new(StaticIssuerProvider::new(
                config.issuer_provider.static_.issuers.clone(),
            ))];
        if let Some(http) = &config.issuer_provider.http {
            issuer_providers.push(Arc::new(HttpIssuerProvider::new(client.clone(), http)));
        }
        let issuer_provider = Arc::new(ChainIssuerProvider::new(issuer_providers));

        let http_key_provider = Arc::new(HttpKeyProvider::new(
            client,
            issuer_provider,
            &config.key_provider.http,
        ));

        let mut key_providers: Vec<Arc<dyn KeyProvider>> = vec![http_key_provider.clone()];
        if config.key_provider.k8s.is_some() {
            tracing::info!("in-cluster key provider enabled");
            key_providers.push(Arc::new(K8sKeyProvider::from_cluster_env()?));
        }
        let key_provider = Arc::new(ChainKeyProvider::new(key_providers));

        let document = DiscoveryDocument::new(&issuer_url);
        let discovery_json = serde_json::to_string(&document)
            .map_err(|err| Error::ConfigInvalid(format!("failed to serialize discovery document: {err}")))?;

        let issuer_path = issuer_url.path().trim_end_matches('/').to_string();

        let state = web::Data::new(AppState::new(discovery_json, key_provider, http_key_provider));

        Ok(Self {
            config,
            issuer_path,
            state,
        })
    }

    /// Handler state, exposed so tests can mount the routes themselves
    pub fn state(&self) -> web::Data<AppState> {
        self.state.clone()
    }

    /// Path prefix the OIDC routes are mounted under (may be empty)
    pub fn issuer_path(&self) -> &str {
        &self.issuer_path
    }

    /// Bind and run the HTTP server
    pub async fn run(self) -> std::io::Result<()> {
        let bind_addr = format!("{}:{}", self.config.server.host, self.config.server.port);

        tracing::info!("starting server on {}", bind_addr);
        tracing::info!(
            "discovery document: http://{}{}/.well-known/openid-configuration",
            bind_addr,
            self.issuer_path
        );

        let state = self.state.clone();
        let issuer_path = self.issuer_path.clone();

        HttpServer::new(move || {
            App::new()
                .wrap(tracing_actix_web::TracingLogger::default())
                .configure(|cfg| configure_routes(cfg, &issuer_path, state.clone()))
        })
        .workers(self.config.server.workers())
        .bind(&bind_addr)?
        .run()
        .await
    }
}

/// Register the health route and the OIDC routes under the issuer path.
/// The health route is registered first so it wins over a root-mounted scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig, issuer_path: &str, state: web::Data<AppState>) {
    cfg.route("/healthz", web::get().to(health));
    cfg.service(
        web::scope(issuer_path)
            .app_data(state)
            .route(
                "/.well-known/openid-configuration",
                web::get().to(discovery_document),
            )
            .route("/keys", web::get().to(keys))
            .route("/keys/{issuer:.*}", web::get().to(issuer_keys)),
    );
}

/// GET {issuer_path}/.well-known/openid-configuration
async fn discovery_document(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(state.discovery_json.clone())
}

/// GET {issuer_path}/keys: the aggregated JWKS
async fn keys(state: web::Data<AppState>) -> HttpResponse {
    match state.key_provider.key_set().await {
        Ok(keys) => HttpResponse::Ok().json(JsonWebKeySet { keys }),
        Err(err) => {
            tracing::error!(error = %err, "failed to assemble aggregated key set");
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": err.to_string() }))
        }
    }
}

/// GET {issuer_path}/keys/{issuer}: single-issuer introspection
async fn issuer_keys(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let issuer = path.into_inner();

    match state.http_key_provider.issuer_key_set(&issuer).await {
        Ok(keys) => HttpResponse::Ok().json(JsonWebKeySet { keys }),
        Err(err) => {
            tracing::error!(issuer = %issuer, error = %err, "failed to get issuer key set");
            let error = Error::from(err);
            let status = StatusCode::from_u16(error.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(status).json(serde_json::json!({ "error": error.to_string() }))
        }
    }
}

/// GET /healthz
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
