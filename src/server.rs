//! HTTP surface: info page, health check, conversion endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::constants::{flags, API_KEY_HEADER, OPEN_PATHS};
use crate::error::{AppError, Result};
use crate::logger::Logger;
use crate::models::{AppConfig, CliRequest, DownloadRequest, MediaFile};
use crate::service::AudioService;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: AudioService,
    /// Empty means the credential gate is off
    pub api_key: Arc<str>,
    pub logger: Logger,
}

impl AppState {
    pub fn new(service: AudioService, config: &AppConfig, logger: Logger) -> Self {
        Self { service, api_key: Arc::from(config.server.api_key.as_str()), logger }
    }
}

/// Builds the router with the API-key guard and CORS applied
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/cli", post(cli))
        .route("/download", post(download))
        .layer(middleware::from_fn_with_state(state.clone(), api_key_guard))
        .layer(cors)
        .with_state(state)
}

/// CORS policy for the configured origins. `*` allows any origin without credentials.
///
/// Every listed origin must be an `http://` or `https://` origin that is a valid
/// header value; a bad entry fails startup instead of being skipped.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|o| parse_origin(o))
        .collect::<Result<Vec<HeaderValue>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

fn parse_origin(origin: &str) -> Result<HeaderValue> {
    let invalid = || AppError::Config(format!("invalid CORS origin: {:?}", origin));
    let host = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
        .ok_or_else(invalid)?;
    if host.is_empty() || host.contains('/') {
        return Err(invalid());
    }
    HeaderValue::from_str(origin).map_err(|_| invalid())
}

/// Run the HTTP server until ctrl-c
pub async fn run(config: &AppConfig, service: AudioService, logger: Logger) -> Result<()> {
    if config.server.api_key.is_empty() {
        logger.log_warning("API_KEY is not set: every endpoint is open to anyone who can reach this server");
    }

    let state = AppState::new(service, config, logger.clone());
    let app = router(state, cors_layer(&config.server.cors_allow_origins)?);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    logger.log_info(&format!("Listening on http://{}", addr));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    logger.log_info("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Rejects requests without the shared secret, except on open paths and CORS preflight
async fn api_key_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let open = OPEN_PATHS.contains(&path) || request.method() == Method::OPTIONS;

    if !state.api_key.is_empty() && !open {
        let supplied = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if supplied != Some(&*state.api_key) {
            state.logger.log_warning(&format!("Unauthorized request to {}", path));
            return AppError::Unauthorized.into_response();
        }
    }

    next.run(request).await
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// `POST /cli`: URL plus allow-listed yt-dlp flags
async fn cli(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CliRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    state.logger.log_info(&format!("POST /cli url={} args={:?}", request.url, request.args));

    let file = state.service.build_and_run(&request.url, &request.args).await?;
    Ok(media_response(file))
}

/// `POST /download`: URL only, best quality mp3
async fn download(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    state.logger.log_info(&format!("POST /download url={}", request.url));

    let args = vec![
        flags::AUDIO_FORMAT.to_string(),
        "mp3".to_string(),
        flags::AUDIO_QUALITY.to_string(),
        "0".to_string(),
    ];
    let file = state.service.build_and_run(&request.url, &args).await?;
    Ok(media_response(file))
}

fn media_response(file: MediaFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.data,
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
