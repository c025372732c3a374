//! HTTP-facing error type
//!
//! Every error body has the shape `{ "error": "<message>" }`.

use crate::auth::AuthError;
use crate::db::StoreError;
use crate::fanout::FanOutError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Store failures are surfaced with the store's own message.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<FanOutError> for AppError {
    fn from(e: FanOutError) -> Self {
        match e {
            FanOutError::InvalidQuantity(_) => AppError::BadRequest(e.to_string()),
            FanOutError::Store(store) => AppError::Store(store),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(e) => {
                tracing::error!(error = %e, "Access verification error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
