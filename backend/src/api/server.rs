//! HTTP Server for the funnel dashboard API.
//!
//! # API Endpoints
//!
//! | Method | Path             | Description                               |
//! |--------|------------------|-------------------------------------------|
//! | GET    | `/health`        | Health check                              |
//! | GET    | `/dashboard`     | Roles (`start`, `end`, `forceForm`)       |
//! | GET    | `/key-wins`      | Key wins (`start`, `end`)                 |
//! | GET    | `/daily-updates` | Daily updates (`start`, `end`, `dept`, `ta`, `country`) |
//! | GET    | `/export/csv`    | Export stub                               |
//! | GET    | `/export/pdf`    | Export stub                               |
//! | GET    | `/api/logs`      | SSE stream for real-time logs             |
//!
//! The three data endpoints always answer 200: source problems become
//! placeholder or empty payloads, and a malformed query string is treated
//! as an empty one.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::Value;
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_warning, LOG_BROADCASTER};
use super::types::{
    error_response, DailyUpdatesQuery, DailyUpdatesResponse, DashboardQuery, DashboardResponse,
    HealthResponse, KeyWinsQuery, KeyWinsResponse, EXPORT_CSV_PLACEHOLDER, EXPORT_PDF_PLACEHOLDER,
};
use crate::config::AppConfig;
use crate::error::ServerResult;
use crate::transform::pipeline::DashboardService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: DashboardService,
}

impl AppState {
    pub fn new(service: DashboardService) -> Self {
        Self { service }
    }
}

/// All routes with permissive CORS.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/key-wins", get(key_wins))
        .route("/daily-updates", get(daily_updates))
        .route("/export/csv", get(export_csv))
        .route("/export/pdf", get(export_pdf))
        .route("/api/logs", get(sse_logs))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: AppState, port: u16) -> ServerResult<()> {
    let source = state.service.source_description();
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "talentfunnel server listening");
    match source {
        Some(source) => tracing::info!(%source, "tabular source configured"),
        None => tracing::warn!("no tabular source configured, /dashboard serves placeholder data"),
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Read configuration through `lookup` and serve. `port` overrides `PORT`.
pub async fn serve_from_lookup<F>(lookup: F, port: Option<u16>) -> ServerResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let config = AppConfig::from_lookup(lookup)?;
    let port = port.unwrap_or(config.port);
    start_server(AppState::new(config.service()), port).await
}

/// [`serve_from_lookup`] over the process environment.
pub async fn serve_from_env(port: Option<u16>) -> ServerResult<()> {
    serve_from_lookup(|name| std::env::var(name).ok(), port).await
}

fn query_or_default<T: Default>(query: Result<Query<T>, QueryRejection>) -> T {
    match query {
        Ok(Query(q)) => q,
        Err(e) => {
            log_warning(format!("Ignoring malformed query string: {}", e));
            T::default()
        }
    }
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.service.source_description()))
}

async fn dashboard(
    State(state): State<AppState>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Json<DashboardResponse> {
    let query = query_or_default(query);
    let roles = state.service.dashboard(&query).await;
    Json(DashboardResponse { roles })
}

async fn key_wins(
    State(state): State<AppState>,
    query: Result<Query<KeyWinsQuery>, QueryRejection>,
) -> Json<KeyWinsResponse> {
    let query = query_or_default(query);
    let wins = state.service.key_wins(&query).await;
    Json(KeyWinsResponse { wins })
}

async fn daily_updates(
    State(state): State<AppState>,
    query: Result<Query<DailyUpdatesQuery>, QueryRejection>,
) -> Json<DailyUpdatesResponse> {
    let query = query_or_default(query);
    let updates = state.service.daily_updates(&query).await;
    Json(DailyUpdatesResponse { updates })
}

async fn export_csv() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/csv")], EXPORT_CSV_PLACEHOLDER)
}

async fn export_pdf() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/pdf")], EXPORT_PDF_PLACEHOLDER)
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(error_response("Not found")))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
