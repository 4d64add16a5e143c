//! HTTP API endpoints for state management.
//!
//! These back the host console's save/load buttons and bank diagnostics.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::replication::SyncPayload;
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct HostQuery {
    pub host: Option<String>,
}

/// Export the current game state as a sync payload.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<SyncPayload> {
    Json(SyncPayload::from_state(&state.snapshot().await))
}

/// Import a saved game state.
///
/// POST /api/state/import?host=true
///
/// Accepts either a bare state or a `{ v, ts, state }` payload. The document
/// is sanitized, replaces the current state and is published to viewers.
/// Without the host flag the request is accepted and ignored.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HostQuery>,
    Json(body): Json<Value>,
) -> Response {
    if Role::from_host_flag(params.host.as_deref()) != Role::Host {
        return StatusCode::NO_CONTENT.into_response();
    }

    let raw = match body.get("state") {
        Some(inner) if inner.is_object() => inner,
        _ => &body,
    };
    if !raw.is_object() {
        return (StatusCode::BAD_REQUEST, "Import failed: expected a JSON object").into_response();
    }

    if state.import_state(raw).await {
        (StatusCode::OK, "State imported successfully").into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BankStatusResponse {
    pub filename: String,
    pub questions: usize,
    pub errors: Vec<String>,
}

/// Validation messages for the loaded bank.
///
/// GET /api/bank/errors
pub async fn bank_errors(State(state): State<Arc<AppState>>) -> Json<BankStatusResponse> {
    let status = state.bank_status().await;
    Json(BankStatusResponse {
        filename: status.filename,
        questions: status.questions,
        errors: status.errors,
    })
}
