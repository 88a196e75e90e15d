//! Application error type mapping to HTTP status codes

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::application::errors::ChatError;

/// Error returned by HTTP handlers
#[derive(Debug)]
pub enum AppError {
    /// Bad request body or parameters.
    Validation(String),
    /// Unknown resource.
    NotFound(String),
    /// Anything raised by the application layer.
    Chat(ChatError),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::Chat(ChatError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Chat(ChatError::NotFound(what)) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::Chat(e) => {
                tracing::error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: AppError| e.into_response().status();

        assert_eq!(status(AppError::Validation("Message is required".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ChatError::InvalidInput("too long".into()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::NotFound("session x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ChatError::NotFound("session y".into()).into()), StatusCode::NOT_FOUND);
        assert_eq!(status(ChatError::Query("engine down".into()).into()), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
