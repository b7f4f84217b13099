//! HTTP routes.
//!
//! | Method | Path | Body / query | Response |
//! |--------|------|--------------|----------|
//! | GET | `/api/search` | `?q=&mode=` | `[StreetHit]` |
//! | POST | `/api/delete` | `{"id": "..."}` | `{"ok": true}` |
//! | GET | `/health` | | `{"status": "ok", "index": "..."}` |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rechovot_fts::SearchMode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::ApiError;
use crate::service::{StreetHit, StreetService};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<StreetService>,
}

impl AppState {
    pub fn new(service: StreetService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/delete", post(delete))
        .route("/health", get(health))
}

#[derive(Debug, Clone, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    mode: Option<String>,
}

#[instrument(name = "GET /api/search", skip(state))]
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StreetHit>>, ApiError> {
    let mode = SearchMode::parse(params.mode.as_deref());
    let hits = state.service.search(&params.q, mode).await?;
    tracing::debug!(hits = hits.len(), %mode, "Search complete");
    Ok(Json(hits))
}

#[derive(Debug, Clone, Deserialize)]
struct DeleteRequest {
    #[serde(default)]
    id: Option<String>,
}

#[instrument(name = "POST /api/delete", skip(state, body))]
async fn delete(
    State(state): State<AppState>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    state
        .service
        .delete(request.id.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(json!({ "ok": true })))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "index": state.service.index() }))
}
