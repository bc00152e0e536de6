//! HTTP server for the equity research page.
//!
//! The browser page keeps a session id and posts its events; every response
//! carries the full session view so the page can re-render from it.

pub mod config;
pub mod controller;
mod embedded_frontend;
mod report_routes;
mod request_id;
mod sector_routes;
mod security_headers;
pub mod session;
mod session_routes;
mod symbol_routes;
#[cfg(test)]
mod testing;
pub mod view;

use analysis_core::{LanguageModel, MarketDataProvider, NewsProvider, TickerSearch};
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use finnhub_client::FinnhubClient;
use llm_client::{LlmConfig, OpenAiClient};
use market_gateway::{MarketGateway, TickerDirectory};
use narrative::NarrativeGenerator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use yahoo_client::YahooClient;

use config::ServerConfig;
use embedded_frontend::FrontendAssets;
use session::SessionStore;

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<MarketGateway>,
    pub news: Arc<dyn NewsProvider>,
    pub narrative: NarrativeGenerator,
    pub directory: Arc<TickerDirectory>,
    pub sessions: SessionStore,
    pub news_lookback_days: i64,
}

impl AppState {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        search: Arc<dyn TickerSearch>,
        news: Arc<dyn NewsProvider>,
        llm: Arc<dyn LanguageModel>,
        directory: TickerDirectory,
    ) -> Self {
        Self {
            gateway: Arc::new(MarketGateway::new(market, search)),
            news,
            narrative: NarrativeGenerator::new(llm),
            directory: Arc::new(directory),
            sessions: SessionStore::new(),
            news_lookback_days: 30,
        }
    }

    pub fn with_news_lookback_days(mut self, days: i64) -> Self {
        self.news_lookback_days = days;
        self
    }

    /// Wire the live providers from configuration
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let timeout = config.http_timeout();
        let yahoo = Arc::new(YahooClient::new(config.yahoo_base_url.clone(), timeout));
        let news = Arc::new(FinnhubClient::new(config.finnhub_api_key.clone(), timeout));
        let llm = Arc::new(OpenAiClient::new(LlmConfig {
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_api_base.clone(),
            model: config.openai_model.clone(),
            timeout,
        }));
        let directory = TickerDirectory::bundled()?;
        tracing::info!("Loaded {} directory entries", directory.len());

        let gateway = MarketGateway::new(yahoo.clone(), yahoo).with_ttl_secs(config.market_cache_ttl_secs);

        Ok(Self {
            gateway: Arc::new(gateway),
            news,
            narrative: NarrativeGenerator::new(llm),
            directory: Arc::new(directory),
            sessions: SessionStore::new(),
            news_lookback_days: config.news_lookback_days,
        })
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error type for handlers; renders as the JSON envelope
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, anyhow::anyhow!(message.into()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        }
        let body = ApiResponse::<()>::error(self.error.to_string());
        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(session_routes::session_routes())
        .merge(report_routes::report_routes())
        .merge(symbol_routes::symbol_routes())
        .merge(sector_routes::sector_routes())
        .fallback(static_handler)
        .with_state(state)
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

/// Serve the embedded page; unknown paths fall back to index.html
async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };

    let (path, file) = match FrontendAssets::get(path) {
        Some(file) => (path, file),
        None => match FrontendAssets::get("index.html") {
            Some(file) => ("index.html", file),
            None => return (StatusCode::NOT_FOUND, "Not found").into_response(),
        },
    };

    let mut response = Response::new(Body::from(file.data.into_owned()));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type(path)));
    response
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let state = AppState::from_config(&config)?;

    let gateway = state.gateway.clone();
    let sessions = state.sessions.clone();
    let session_idle_ttl_secs = config.session_idle_ttl_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            gateway.evict_expired();
            sessions.evict_idle(session_idle_ttl_secs);
        }
    });

    let app = build_router(state, cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Equity research server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state, FakeWorld};
    use axum::body::to_bytes;
    use axum::http::Method;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(test_state(FakeWorld::default()), CorsLayer::permissive())
    }

    #[tokio::test]
    async fn test_health_sets_headers() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "ok");
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::GET)
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("app.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_app_error_statuses() {
        let response = AppError::not_found("Session not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_app_error_debug_shows_status() {
        let result: Result<(), AppError> = Err(AppError::bad_request("Query cannot be empty"));
        let rendered = format!("{:?}", result.unwrap_err());
        assert!(rendered.contains("400"));
        assert!(rendered.contains("Query cannot be empty"));
    }
}
