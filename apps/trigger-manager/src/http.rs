use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use nomios_core::{ErrorResponse, EventUri, NormalizedEvent, VersionInfo};
use nomios_telemetry::{PIPELINES_STARTED, TelemetryLabels, record_counter};
use nomios_triggers::{PipelineError, SharedTriggerStore, Trigger, TriggerError};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct ManagerState {
    pub store: SharedTriggerStore,
}

fn error_response(status: StatusCode, message: impl Into<String>, err: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse::new(status.as_u16(), message, err)),
    )
        .into_response()
}

fn store_failure(message: &str, err: TriggerError) -> Response {
    error!(error = %err, "{message}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message, err)
}

pub fn build_router(store: SharedTriggerStore) -> Router {
    let state = Arc::new(ManagerState { store });
    Router::new()
        .route("/triggers", get(list_triggers).post(add_trigger))
        .route(
            "/triggers/{id}",
            get(get_trigger).put(update_trigger).delete(delete_trigger),
        )
        .route("/run/{id}", post(run_trigger))
        .route("/trigger/{id}", post(run_trigger))
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/version", get(|| async { VersionInfo::current().human() }))
        .route("/ping", get(|| async { "PONG" }))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

async fn list_triggers(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<Arc<ManagerState>>,
) -> Response {
    let filter = params.get("filter").map(String::as_str).unwrap_or_default();
    match state.store.list(filter).await {
        Ok(triggers) if triggers.is_empty() => error_response(
            StatusCode::NOT_FOUND,
            "No triggers found!",
            format!("no trigger matches '{filter}'"),
        ),
        Ok(triggers) => Json(triggers).into_response(),
        Err(err) => store_failure("Failed to get list of triggers!", err),
    }
}

async fn get_trigger(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<ManagerState>>,
) -> Response {
    match state.store.get(&id).await {
        Ok(trigger) if trigger.is_empty() => error_response(
            StatusCode::NOT_FOUND,
            format!("No trigger {id} found!"),
            "trigger not found",
        ),
        Ok(trigger) => Json(trigger).into_response(),
        Err(err) => store_failure("Failed to get trigger!", err),
    }
}

fn parse_trigger(body: &[u8]) -> Result<Trigger, Response> {
    let trigger: Trigger = serde_json::from_slice(body)
        .map_err(|err| error_response(StatusCode::BAD_REQUEST, "Invalid trigger", err))?;
    if !trigger.has_required_fields() {
        return Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Required fields are empty!",
            TriggerError::MissingFields,
        ));
    }
    Ok(trigger)
}

async fn add_trigger(Extension(state): Extension<Arc<ManagerState>>, body: Bytes) -> Response {
    let trigger = match parse_trigger(&body) {
        Ok(trigger) => trigger,
        Err(resp) => return resp,
    };
    let id = trigger.event.clone();
    match state.store.add(trigger).await {
        Ok(()) => {
            info!(trigger = %id, "trigger added");
            StatusCode::OK.into_response()
        }
        Err(err) => store_failure("Failed to add trigger!", err),
    }
}

/// The path id names the trigger; an `event` in the body must agree with it.
async fn update_trigger(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<ManagerState>>,
    body: Bytes,
) -> Response {
    let mut raw: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, "Invalid trigger", err),
    };
    if let Some(obj) = raw.as_object_mut() {
        match obj.get("event").and_then(|v| v.as_str()) {
            Some(event) if !event.is_empty() && event != id => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Invalid trigger",
                    format!("event '{event}' does not match trigger '{id}'"),
                );
            }
            _ => {
                obj.insert("event".into(), serde_json::Value::String(id.clone()));
            }
        }
    }
    let trigger = match parse_trigger(raw.to_string().as_bytes()) {
        Ok(trigger) => trigger,
        Err(resp) => return resp,
    };
    match state.store.update(trigger).await {
        Ok(()) => {
            info!(trigger = %id, "trigger updated");
            StatusCode::OK.into_response()
        }
        Err(err) => store_failure("Failed to update trigger!", err),
    }
}

async fn delete_trigger(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<ManagerState>>,
) -> Response {
    match state.store.delete(&id).await {
        Ok(()) => {
            info!(trigger = %id, "trigger deleted");
            StatusCode::OK.into_response()
        }
        Err(err) => store_failure("Failed to delete trigger!", err),
    }
}

async fn run_trigger(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<ManagerState>>,
    body: Bytes,
) -> Response {
    let event: NormalizedEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, "Invalid event", err),
    };

    if let Err(err) = state.store.check_secret(&id, &event.secret).await {
        return match err {
            TriggerError::InvalidSecret { .. } => {
                warn!(trigger = %id, "rejected event with invalid secret");
                error_response(StatusCode::UNAUTHORIZED, "Invalid secret!", err)
            }
            other => store_failure("Failed to check trigger secret!", other),
        };
    }

    match state.store.run(&id, &event.variables).await {
        Ok(runs) if runs.is_empty() => {
            debug!(trigger = %id, "no pipelines subscribed");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(runs) => {
            let provider = EventUri::parse(&id)
                .map(|uri| uri.provider.as_str())
                .unwrap_or("unknown");
            record_counter(
                PIPELINES_STARTED,
                runs.len() as u64,
                &TelemetryLabels::new(provider),
            );
            Json(runs).into_response()
        }
        Err(TriggerError::Pipeline(err @ PipelineError::NotFound { .. })) => {
            warn!(trigger = %id, error = %err, "pipeline not found");
            error_response(StatusCode::NOT_FOUND, "Pipeline not found!", err)
        }
        Err(err) => store_failure("Failed to run trigger pipelines!", err),
    }
}
