use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::auth::{AuthError, Principal};

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// API key authentication extractor for protected routes
///
/// Rejects with 401 before the handler body runs, so no registry operation
/// sees an unauthenticated request.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(
///     ApiKeyAuth(principal): ApiKeyAuth,
/// ) -> Result<String, ApiError> {
///     Ok(format!("Hello {}", principal.id))
/// }
/// ```
pub struct ApiKeyAuth(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .ok_or(AuthError::MissingKey)?;

        let principal = state.verifier.verify(key).await.map_err(|e| {
            tracing::debug!(error = %e, "API key rejected");
            e
        })?;

        Ok(ApiKeyAuth(principal))
    }
}
