//! HTTP handlers
//!
//! Endpoints:
//! - POST   /api/chat/query                   - Send a chat message
//! - GET    /api/chat/sessions                - List recent sessions
//! - GET    /api/chat/sessions/{id}/messages  - Conversation history
//! - DELETE /api/chat/sessions/{id}           - Delete a session
//! - GET    /api/chat/sessions/{id}/stream    - Live messages (SSE)
//! - POST   /api/sql-query                    - Raw NL-to-SQL search

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;

use super::error::AppError;
use super::AppState;
use crate::application::formatter::{format_for_frontend, format_properties};
use crate::domain::entities::StoredMessage;

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub user_id: Option<i64>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct SqlQueryRequest {
    #[serde(default)]
    pub message: String,
}

fn require_message(message: &str) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("Message is required".to_string()));
    }
    Ok(())
}

/// POST /api/chat/query
pub async fn chat_query(
    State(state): State<AppState>,
    Json(body): Json<ChatQuery>,
) -> Result<Json<Value>, AppError> {
    require_message(&body.message)?;

    let outcome = state
        .dispatcher
        .process(&body.message, body.session_id.as_deref(), body.user_id)
        .await?;

    let mut payload = format_for_frontend(&outcome.response);
    if let Value::Object(map) = &mut payload {
        map.insert("session_id".to_string(), Value::from(outcome.session_id));
    }
    Ok(Json(payload))
}

/// GET /api/chat/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Value>, AppError> {
    let sessions = state.chat.list_sessions(query.user_id, query.limit).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// GET /api/chat/sessions/{id}/messages
pub async fn session_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let messages = state.chat.history(&id).await?;
    Ok(Json(json!({ "session_id": id, "messages": messages })))
}

/// DELETE /api/chat/sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.chat.delete_session(&id).await? {
        return Err(AppError::NotFound(format!("session {}", id)));
    }
    tracing::info!("Deleted session {}", id);
    Ok(Json(json!({ "deleted": true, "session_id": id })))
}

fn message_event(message: &StoredMessage) -> Event {
    let data = serde_json::to_string(message).unwrap_or_default();
    Event::default().event("message").data(data)
}

/// GET /api/chat/sessions/{id}/stream - history replay, then live messages
pub async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Subscribe before reading history so nothing recorded in between is lost
    let mut live = state.chat.subscribe();
    let history = state.chat.history(&id).await?;

    let stream = async_stream::stream! {
        for message in &history {
            yield Ok::<_, Infallible>(message_event(message));
        }

        loop {
            match live.recv().await {
                Ok(message) if message.session_id == id => {
                    yield Ok(message_event(&message));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Stream for session {} skipped {} messages", id, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

/// POST /api/sql-query
pub async fn sql_query(
    State(state): State<AppState>,
    Json(body): Json<SqlQueryRequest>,
) -> Result<Json<Value>, AppError> {
    require_message(&body.message)?;

    let result = state.listings.query(&body.message).await?;
    if result.is_empty() {
        return Ok(Json(json!({ "result": "No results found.", "sql_query": result.sql })));
    }

    let rows: Vec<Value> = result.rows.into_iter().map(Value::Object).collect();
    let ranked = state.listings.rank_and_filter(&body.message, rows).await?;
    let ranked = format_properties(&ranked);

    Ok(Json(json!({
        "result": ranked,
        "property_count": ranked.len(),
        "friendly_message": result.chat_response,
        "sql_query": result.sql,
    })))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
