use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::AuthError;
use crate::domain::errors::{FieldError, RegistryError};

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Vec<FieldError>>,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 400 error carrying field-level validation failures
    pub fn validation(details: Vec<FieldError>) -> Self {
        Self {
            details: Some(details),
            ..Self::bad_request("Validation Error")
        }
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 500 Internal Server Error
    ///
    /// The detail is logged; callers only ever see a generic message.
    pub fn internal_server_error(detail: impl Into<String>) -> Self {
        let detail: String = detail.into();
        tracing::error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({
                "success": false,
                "error": self.message,
                "details": details,
            }),
            None => json!({
                "success": false,
                "error": self.message,
            }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(details) => Self::validation(details),
            RegistryError::NotFound(_) => Self::not_found("Agent not found"),
            err @ RegistryError::InvalidStateTransition { .. } => Self::conflict(err.to_string()),
            RegistryError::Conflict(message) => Self::conflict(message),
            RegistryError::Store(message) => Self::internal_server_error(message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingKey => Self::unauthorized("Missing X-API-Key header"),
            AuthError::InvalidKey => Self::unauthorized("Invalid API key"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentStatus;
    use uuid::Uuid;

    #[test]
    fn registry_errors_map_to_statuses() {
        let cases = [
            (RegistryError::invalid_field("name", "must not be empty"), StatusCode::BAD_REQUEST),
            (RegistryError::NotFound(Uuid::new_v4()), StatusCode::NOT_FOUND),
            (
                RegistryError::InvalidStateTransition {
                    status: AgentStatus::Revoked,
                    attempted: "bind an owner to".into(),
                },
                StatusCode::CONFLICT,
            ),
            (RegistryError::Conflict("raced".into()), StatusCode::CONFLICT),
            (RegistryError::Store("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn validation_keeps_field_details() {
        let err = ApiError::from(RegistryError::invalid_field("ownerEmail", "must be a valid email address"));

        assert_eq!(err.message, "Validation Error");
        assert_eq!(err.details.unwrap()[0].field, "ownerEmail");
    }

    #[test]
    fn store_failure_hides_detail() {
        let err = ApiError::from(RegistryError::Store("password authentication failed".into()));
        assert_eq!(err.message, "Internal Server Error");
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        assert_eq!(ApiError::from(AuthError::MissingKey).status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::InvalidKey).status, StatusCode::UNAUTHORIZED);
    }
}
