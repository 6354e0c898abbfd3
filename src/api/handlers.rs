use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::models::{StatusFilter, Token};
use crate::AppState;

// ── Request DTOs ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateTokenRequest {
    pub active: bool,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub query: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /
pub async fn welcome() -> Json<Value> {
    Json(json!({ "msg": "Hello world :)" }))
}

/// GET /readyz — succeeds once the database answers
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.db.ping().await.map_err(|e| {
        tracing::error!("readiness check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

/// GET /tokens — active tokens, or inactive ones with `?query=inactive`.
/// A query string that does not deserialize lists active tokens.
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Token>>, ApiError> {
    let query = match params {
        Ok(Query(params)) => params.query,
        Err(e) => {
            tracing::debug!("list_tokens: ignoring query string: {}", e);
            None
        }
    };
    let filter = StatusFilter::from_query(query.as_deref());
    let tokens = state.db.list(filter).await?;
    Ok(Json(tokens))
}

/// POST /tokens — create a token or reactivate an archived one with the same name
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTokenRequest>, JsonRejection>,
) -> Result<Json<Token>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        tracing::warn!("create_token: invalid body: {}", e);
        ApiError::BadRequest(e.body_text())
    })?;

    let token = state.db.create_or_reactivate(&payload.name).await?;
    Ok(Json(token))
}

/// GET /tokens/:id
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<Token>, ApiError> {
    let id = parse_id(&id_str)?;
    let token = state.db.get(id).await?;
    Ok(Json(token))
}

/// PATCH /tokens/:id — set the active flag
pub async fn update_token(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    payload: Result<Json<UpdateTokenRequest>, JsonRejection>,
) -> Result<Json<Token>, ApiError> {
    let id = parse_id(&id_str)?;
    let Json(payload) = payload.map_err(|e| {
        tracing::warn!("update_token: invalid body: {}", e);
        ApiError::BadRequest(e.body_text())
    })?;

    let token = state.db.set_active(id, payload.active).await?;
    Ok(Json(token))
}

/// Ids that are not integers cannot exist, so they read as not-found.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        tracing::debug!("non-numeric token id: {}", raw);
        ApiError::NotFound(raw.to_string())
    })
}
