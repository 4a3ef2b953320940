use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use quill_core::{CommandError, DomainError};

pub fn command_error_to_response(err: CommandError) -> axum::response::Response {
    match err {
        CommandError::Unauthorized(_) => forbidden(),
        CommandError::NotFound(e) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        CommandError::Invalid(failure) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "validation_failed",
                "problems": failure.problems,
            })),
        )
            .into_response(),
        CommandError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        CommandError::Domain(e) => json_error(StatusCode::CONFLICT, "conflict", e.to_string()),
        CommandError::Store(e) => {
            error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
    }
}

/// The only body an authorization failure ever gets.
pub fn forbidden() -> axum::response::Response {
    (StatusCode::FORBIDDEN, axum::Json(json!({ "reason": "Unauthorized" }))).into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
