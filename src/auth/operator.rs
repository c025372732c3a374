//! Bearer access-code extractor for Axum handlers

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use crate::core::http::AppState;
use crate::error::AppError;

/// Proof that the request carried a valid operator access code in
/// `Authorization: Bearer <code>`.
#[derive(Debug, Clone, Copy)]
pub struct Operator;

fn bearer_code(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid Authorization format. Expected: Bearer <code>".into())
    })
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let code = bearer_code(parts)?;
        if state.verifier.verify(code).await? {
            Ok(Operator)
        } else {
            warn!(path = %parts.uri.path(), "Rejected request with invalid access code");
            Err(AppError::Unauthorized("Invalid access code".into()))
        }
    }
}
