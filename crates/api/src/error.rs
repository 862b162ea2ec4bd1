//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

/// Application error type.
///
/// Authorization failures deliberately collapse to opaque 401/403 variants:
/// the wire never distinguishes "unknown account" from "wrong secret" from
/// "share code not yours", so responses carry no account-existence signal.
/// The internal cause travels in `Forbidden`'s payload for logging only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication / authorization
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden(#[source] Option<AuthFailure>),

    // Validation
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Resources
    #[error("Resource already exists")]
    Conflict(String),

    // Internal
    #[error("Store unavailable")]
    Unavailable(#[source] StoreError),
    #[error("Internal server error")]
    Internal(String),
}

/// Internal reasons an authorization was denied. Logged, never sent verbatim.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("account not found")]
    AccountNotFound,
    #[error("device secret mismatch")]
    SecretMismatch,
    #[error("device not registered and no share code supplied")]
    DeviceNotRegistered,
    #[error("share code is invalid")]
    ShareCodeInvalid,
    #[error("share code does not belong to this account")]
    ShareCodeMismatch,
    #[error("no account in request context")]
    NoAccountInContext,
}

impl ApiError {
    pub fn forbidden(cause: AuthFailure) -> Self {
        ApiError::Forbidden(Some(cause))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
            ),
            ApiError::Forbidden(cause) => {
                if let Some(cause) = cause {
                    tracing::debug!(cause = %cause, "authorization denied");
                }
                (StatusCode::FORBIDDEN, "FORBIDDEN", "Forbidden".to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Unavailable(err) => {
                tracing::error!(error = %err, "store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service unavailable".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            // The loser of a racing create surfaces the conflict, never overwrites
            StoreError::AccountAlreadyExists(username) => {
                ApiError::Conflict(format!("account {username} already exists"))
            }
            other => ApiError::Unavailable(other),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_body_is_opaque() {
        // No matter the internal cause, the wire body must be identical
        let with_cause = ApiError::forbidden(AuthFailure::SecretMismatch).into_response();
        let other_cause = ApiError::forbidden(AuthFailure::ShareCodeInvalid).into_response();
        assert_eq!(with_cause.status(), StatusCode::FORBIDDEN);
        assert_eq!(other_cause.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::BadRequest("nope".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
