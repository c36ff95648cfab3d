//! HTTP request handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::normalizer::RawInput;
use crate::schema::FeatureSchema;
use crate::service::Outcome;

use super::error::{status_for, Result, ServerError};
use super::state::AppState;

fn outcome_response<T: Serialize>(outcome: Outcome<T>) -> Response {
    let status = outcome
        .failure()
        .map(|f| status_for(f.kind))
        .unwrap_or(StatusCode::OK);
    (status, Json(outcome)).into_response()
}

/// Liveness and loaded artifact identity
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let pipeline = state.service.pipeline();
    Json(json!({
        "status": "ok",
        "artifact": pipeline.name(),
        "artifact_digest": pipeline.digest(),
        "digest_pinned": state.config.artifact_sha256.is_some(),
        "schema_version": pipeline.schema().version,
        "uptime_secs": state.uptime_secs(),
    }))
}

pub async fn get_schema(State(state): State<Arc<AppState>>) -> Json<FeatureSchema> {
    Json(state.service.schema().clone())
}

/// Dropdown levels per categorical field
pub async fn get_options(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, Vec<String>>> {
    Json(state.service.options())
}

/// Predict a price from a raw input object
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RawInput>, JsonRejection>,
) -> Result<Response> {
    let Json(raw) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    Ok(outcome_response(state.service.predict(&raw)))
}

/// Ranked feature importance report
pub async fn explain(State(state): State<Arc<AppState>>) -> Response {
    outcome_response(state.service.explain())
}

pub async fn not_found() -> ServerError {
    ServerError::NotFound("Unknown endpoint. See /api/health.".to_string())
}
