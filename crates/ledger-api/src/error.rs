//! Maps [`LedgerError`] onto the uniform HTTP error envelope (spec.md §6.1,
//! §7): `{ "message": "...", "extra": { "fields": {...} } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledger_core::LedgerError;
use serde::Serialize;
use serde_json::json;

pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    message: String,
    extra: serde_json::Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, extra) = match self.0 {
            LedgerError::Validation { fields, .. } => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                json!({ "fields": fields }),
            ),
            LedgerError::Permission(msg) => (StatusCode::FORBIDDEN, msg, json!({})),
            LedgerError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg, json!({})),
            LedgerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, json!({})),
            LedgerError::Conflict(msg) => {
                tracing::error!(msg, "serialization conflict exhausted retries");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, json!({}))
            }
            LedgerError::Storage(msg) => {
                tracing::error!(msg, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, json!({}))
            }
        };
        (status, Json(ErrorEnvelope { message, extra })).into_response()
    }
}
