use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use paddock_core::GameError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    BadGateway(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(m) | Self::NotFound(m) | Self::BadGateway(m) | Self::Internal(m) => {
                write!(f, "{m}")
            },
        }
    }
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Validation(m) | GameError::DataIncomplete(m) => Self::BadRequest(m),
            GameError::SourceUnavailable(m) => Self::BadGateway(m),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Self::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
