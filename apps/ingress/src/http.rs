use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use nomios_core::{EventInfoConfig, VersionInfo, event_info};
use nomios_dispatch::TriggerClient;
use nomios_providers::{IngestOutcome, ProviderKind, WebhookQuery, ingest};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::reqid::with_request_id;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn TriggerClient>,
    pub event_info: EventInfoConfig,
}

impl AppState {
    pub fn new(client: Arc<dyn TriggerClient>, event_info: EventInfoConfig) -> Self {
        Self { client, event_info }
    }
}

#[derive(Serialize, Debug)]
pub struct ApiError {
    error: String,
}

fn bad_request(err: impl ToString) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: err.to_string(),
        }),
    )
        .into_response()
}

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/nomios/{provider}", post(webhook))
        .route(
            "/nomios/event/{uri}/{secret}",
            get(get_event_info).delete(not_implemented),
        )
        .route("/event/{uri}/{secret}", get(get_event_info).delete(not_implemented))
        .route(
            "/nomios/event/{uri}/{secret}/{credentials}",
            post(not_implemented),
        )
        .route("/event/{uri}/{secret}/{credentials}", post(not_implemented))
        .route("/nomios/health", get(health))
        .route("/health", get(health))
        .route("/nomios/version", get(version))
        .route("/version", get(version))
        .route("/nomios/ping", get(ping))
        .route("/ping", get(ping))
        .route("/nomios/", get(version))
        .route("/", get(version))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(with_request_id))
}

async fn webhook(
    Path(provider): Path<String>,
    Query(query): Query<WebhookQuery>,
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let Ok(kind) = provider.parse::<ProviderKind>() else {
        debug!(provider = %provider, "webhook for unknown provider");
        return StatusCode::NOT_FOUND.into_response();
    };
    let adapter = kind.adapter();
    match ingest(adapter.as_ref(), state.client.as_ref(), &body, &query).await {
        Ok(IngestOutcome::Skipped) | Ok(IngestOutcome::Dispatched { .. }) => {
            StatusCode::OK.into_response()
        }
        // dispatch failures answer 400 as well, never 5xx
        Err(err) => bad_request(err),
    }
}

async fn get_event_info(
    Path((uri, secret)): Path<(String, String)>,
    Extension(state): Extension<Arc<AppState>>,
) -> Response {
    match event_info(&state.event_info, &uri, &secret) {
        Ok(info) => Json(info).into_response(),
        Err(err) => {
            warn!(event_uri = %uri, error = %err, "event info requested for invalid uri");
            bad_request(err)
        }
    }
}

async fn not_implemented() -> StatusCode {
    StatusCode::NOT_IMPLEMENTED
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn version() -> String {
    VersionInfo::current().human()
}

async fn ping() -> &'static str {
    "PONG"
}
