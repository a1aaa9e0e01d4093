//! API error type that converts domain errors to HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Error body returned by every endpoint: `{"error": ..., "code": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Error returned from route handlers.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(self.0.code)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::new(ErrorCode::ValidationFailed, rejection.body_text()))
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed | ErrorCode::UnknownTier | ErrorCode::InvalidWebhook => {
            StatusCode::BAD_REQUEST
        }
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::UserNotFound => StatusCode::NOT_FOUND,
        ErrorCode::BillingNotLinked => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::NoBillingAccount
        | ErrorCode::PaymentProviderError
        | ErrorCode::IdentityProviderError
        | ErrorCode::DatabaseError
        | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Whether the message is safe to show to the client.
///
/// Billing errors carry a best-effort explanation; infrastructure errors may
/// leak SQL or provider internals.
fn is_client_visible(code: ErrorCode) -> bool {
    !matches!(
        code,
        ErrorCode::DatabaseError | ErrorCode::IdentityProviderError | ErrorCode::InternalError
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = %self.0.code, error = %self.0.message, "Request failed");
        }

        let message = if is_client_visible(self.0.code) {
            self.0.message
        } else {
            "Internal server error".to_string()
        };
        let body = ErrorResponse::new(self.0.code.to_string(), message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_codes_to_statuses() {
        let cases = [
            (ErrorCode::ValidationFailed, StatusCode::BAD_REQUEST),
            (ErrorCode::UnknownTier, StatusCode::BAD_REQUEST),
            (ErrorCode::InvalidWebhook, StatusCode::BAD_REQUEST),
            (ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED),
            (ErrorCode::InsufficientCredits, StatusCode::PAYMENT_REQUIRED),
            (ErrorCode::Forbidden, StatusCode::FORBIDDEN),
            (ErrorCode::UserNotFound, StatusCode::NOT_FOUND),
            (ErrorCode::BillingNotLinked, StatusCode::SERVICE_UNAVAILABLE),
            (ErrorCode::NoBillingAccount, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorCode::PaymentProviderError, StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorCode::DatabaseError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            assert_eq!(ApiError::from(DomainError::new(code, "x")).status(), status);
        }
    }

    #[test]
    fn database_details_are_hidden() {
        assert!(!is_client_visible(ErrorCode::DatabaseError));
        assert!(is_client_visible(ErrorCode::PaymentProviderError));
        assert!(is_client_visible(ErrorCode::InsufficientCredits));
    }

    #[test]
    fn error_response_serializes_error_and_code() {
        let json = serde_json::to_value(ErrorResponse::new("FORBIDDEN", "Admin access required"))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "Admin access required", "code": "FORBIDDEN"})
        );
    }
}
