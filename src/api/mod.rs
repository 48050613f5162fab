// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod state;

use axum::{
    routing::{get, patch, post},
    Router,
};

use handlers::{agents, health};
pub use state::AppState;

/// Builds the HTTP router over the given state
///
/// Everything under `/v1` requires an `X-API-Key` header.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Agent routes
        .route("/v1/agents", post(agents::create_agent).get(agents::list_agents))
        .route("/v1/agents/:id", get(agents::get_agent))
        .route("/v1/agents/:id/owner", post(agents::bind_owner))
        .route("/v1/agents/:id/status", patch(agents::change_status))
        .route("/v1/agents/:id/audit-logs", get(agents::list_audit_logs))
        .fallback(health::not_found)
        // Shared state
        .with_state(state)
}
