use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::chat::{CHAT_UNAVAILABLE, ChatError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed request body")]
    MalformedPayload,

    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Wraps a storage failure with the message shown to the caller.
    pub fn storage(context: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Storage { context, source }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload | AppError::MissingFields => StatusCode::BAD_REQUEST,
            AppError::Storage { .. } | AppError::Chat(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("{self}");
        }

        let body = match self {
            AppError::Storage { context, .. } => ErrorBody {
                success: false,
                message: context.to_string(),
                error: None,
            },
            AppError::Chat(e) => ErrorBody {
                success: false,
                message: CHAT_UNAVAILABLE.to_string(),
                error: Some(e.to_string()),
            },
            other => ErrorBody {
                success: false,
                message: other.to_string(),
                error: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
