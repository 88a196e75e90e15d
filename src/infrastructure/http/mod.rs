//! HTTP API (axum)
//!
//! All chat routes live under `/api/`. Middleware: CORS and request tracing.

pub mod error;
pub mod handlers;


use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::errors::ChatError;
use crate::application::messaging::Dispatcher;
use crate::application::services::{ChatService, ListingService};
use crate::infrastructure::config::ServerConfig;

pub use error::AppError;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub chat: Arc<ChatService>,
    pub listings: Arc<ListingService>,
}

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState, permissive_cors: bool) -> Router {
    let api_routes = Router::new()
        .route("/chat/query", post(handlers::chat_query))
        .route("/chat/sessions", get(handlers::list_sessions))
        .route("/chat/sessions/{id}", delete(handlers::delete_session))
        .route("/chat/sessions/{id}/messages", get(handlers::session_messages))
        .route("/chat/sessions/{id}/stream", get(handlers::stream_session))
        .route("/sql-query", post(handlers::sql_query));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::health));

    if permissive_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<(), ChatError> {
    let router = build_router(state, config.permissive_cors);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .map_err(|e| ChatError::Internal(format!("Failed to bind {}: {}", config.bind, e)))?;
    tracing::info!("Tourwise chat API listening on http://{}", config.bind);

    axum::serve(listener, router)
        .await
        .map_err(|e| ChatError::Internal(format!("Server error: {}", e)))
}
