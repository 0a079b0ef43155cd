//! Translation of ledger errors into HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use moneta_core::LedgerError;
use moneta_shared::types::TransactionId;
use serde_json::json;
use tracing::warn;

/// Builds the `{data: id}` body returned by every successful mutation.
pub fn data_response(id: TransactionId) -> Response {
    (StatusCode::OK, Json(json!({ "data": id }))).into_response()
}

/// Maps ledger errors to responses.
///
/// Every condition has a fixed status and numeric code. Unexpected errors
/// are logged where they are raised and reach the client only as
/// `unexpected error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponder;

impl ErrorResponder {
    /// Renders `err` as a response.
    pub fn respond(&self, err: &LedgerError) -> Response {
        match err {
            // A replay answers like the original request.
            LedgerError::DuplicateIdempotencyKey(id) => return data_response(*id),
            LedgerError::FailedConvert(_) => warn!(error = ?err, "Conversion failed"),
            _ => {}
        }

        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "code": err.error_code(),
                "message": err.public_message()
            })),
        )
            .into_response()
    }
}
