//! REST and WebSocket handlers

use crate::errors::{HttpError, HttpResult};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use board_share::ViewerSession;
use board_store::{Document, DocumentSummary};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

/// REST routes under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/whiteboards", get(list_whiteboards))
        .route("/api/whiteboard", get(get_whiteboard))
        .route("/api/whiteboard/new", post(create_whiteboard))
        .route("/api/whiteboard/save", post(save_whiteboard))
        .route("/api/whiteboard/generate-share", get(generate_share))
        .route("/api/whiteboard/get-by-share", get(get_by_share))
        .route("/api/whiteboard/:board_id", delete(delete_whiteboard))
}

#[derive(Debug, Deserialize)]
pub struct BoardQuery {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardIdQuery {
    board_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareQuery {
    share_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    board_id: Option<String>,
    title: Option<String>,
    content: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    success: bool,
    board_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    share_id: String,
}

#[derive(Debug, Serialize)]
pub struct SharedBoard {
    title: String,
    content: Value,
}

/// Non-empty query or body field
fn required(value: Option<String>, name: &str) -> HttpResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HttpError::bad_request(format!("Missing {}", name)))
}

/// `null`, `false`, `""` and zero carry no drawing
fn is_blank_content(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

async fn list_whiteboards(State(state): State<AppState>) -> HttpResult<Json<Vec<DocumentSummary>>> {
    Ok(Json(state.service.list().await?))
}

async fn create_whiteboard(State(state): State<AppState>) -> HttpResult<Json<CreatedResponse>> {
    let document = state.service.create().await?;
    Ok(Json(CreatedResponse {
        success: true,
        board_id: document.board_id,
    }))
}

async fn get_whiteboard(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> HttpResult<Json<Document>> {
    let id = required(query.id, "boardId")?;
    state
        .service
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| HttpError::not_found("Whiteboard"))
}

async fn save_whiteboard(
    State(state): State<AppState>,
    body: Result<Json<SaveRequest>, JsonRejection>,
) -> HttpResult<Json<Value>> {
    let Json(request) = body.map_err(|e| {
        warn!("Rejected save request: {}", e);
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HttpError::payload_too_large(state.max_request_size)
        } else {
            HttpError::bad_request("Missing parameters")
        }
    })?;

    let (Some(board_id), Some(title), Some(content)) = (
        request.board_id.filter(|v| !v.is_empty()),
        request.title.filter(|v| !v.is_empty()),
        request.content.filter(|v| !is_blank_content(v)),
    ) else {
        return Err(HttpError::bad_request("Missing parameters"));
    };

    state.service.save(&board_id, title, content).await?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_whiteboard(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> HttpResult<Json<Value>> {
    state.service.delete(&board_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn generate_share(
    State(state): State<AppState>,
    Query(query): Query<BoardIdQuery>,
) -> HttpResult<Json<ShareResponse>> {
    let board_id = required(query.board_id, "boardId")?;
    let share_id = state.service.generate_share(&board_id).await?;
    Ok(Json(ShareResponse { share_id }))
}

async fn get_by_share(
    State(state): State<AppState>,
    Query(query): Query<ShareQuery>,
) -> HttpResult<Json<SharedBoard>> {
    let share_id = required(query.share_id, "shareId")?;
    let document = state
        .service
        .get_by_share(&share_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Share link"))?;

    Ok(Json(SharedBoard {
        title: document.title,
        content: document.content,
    }))
}

/// Upgrade into a viewer session
pub async fn viewer_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let ws = match state.ws_config.max_message_size {
        Some(limit) => ws.max_message_size(limit),
        None => ws,
    };

    let registry = state.registry.clone();
    let config = state.ws_config.clone();
    ws.on_upgrade(move |socket| ViewerSession::serve(socket, registry, config))
}

/// Health check with live share counts
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "board-http",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "shares": state.registry.stats().await,
    }))
}
