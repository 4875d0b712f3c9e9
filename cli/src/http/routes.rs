//! HTTP route handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use ccproxy_core::api::{AggregateError, AggregateRequest, AggregateResponse, TaskDescriptor};
use chrono::Local;
use serde_json::Value;

use crate::http::{
    models::*,
    state::AppState,
    validation::{client_headers, invalid_json},
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/cc/aggregate", post(aggregate_handler))
        .route("/cc/proxy", post(proxy_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// POST /cc/aggregate - run a batch of dependent tasks
async fn aggregate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AggregateRequest>, JsonRejection>,
) -> Result<Json<AggregateResponse>, HttpServerError> {
    state.record_request("/cc/aggregate");

    let Json(request) = payload.map_err(|rejection| {
        state.record_error();
        invalid_json(rejection)
    })?;

    match state
        .scheduler
        .aggregate(&request, &client_headers(&headers))
        .await
    {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            state.record_error();
            Err(err.into())
        }
    }
}

/// POST /cc/proxy - run one task and return its data directly
async fn proxy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TaskDescriptor>, JsonRejection>,
) -> Result<Json<Value>, HttpServerError> {
    state.record_request("/cc/proxy");

    let Json(task) = payload.map_err(|rejection| {
        state.record_error();
        invalid_json(rejection)
    })?;
    let id = task.id.clone();
    let request = AggregateRequest::single(task);

    match state
        .scheduler
        .aggregate(&request, &client_headers(&headers))
        .await
    {
        Ok(response) => {
            let data = response.data.into_inner().remove(&id).unwrap_or(Value::Null);
            Ok(Json(data))
        }
        Err(err) => {
            state.record_error();
            Err(match err {
                AggregateError::TaskFailed { detail, .. } => {
                    HttpServerError::ProxyTaskFailed(detail)
                }
                other => other.into(),
            })
        }
    }
}

/// GET /health
async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, HttpServerError> {
    let stats = state
        .stats
        .read()
        .map_err(|_| HttpServerError::Internal("stats lock poisoned".into()))?;

    Ok(Json(HealthResponse {
        status: "healthy".into(),
        session_id: state.session_id.clone(),
        uptime_seconds: stats.uptime_seconds(),
        requests_handled: stats.requests_total,
        errors_total: stats.errors_total,
        timestamp: Local::now().to_rfc3339(),
    }))
}
