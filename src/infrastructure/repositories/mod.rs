// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory_store;
pub mod postgres_agent_repository;
pub mod postgres_audit_log_repository;

pub use in_memory_store::InMemoryStore;
pub use postgres_agent_repository::PostgresAgentRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;

use crate::domain::errors::StoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Classifies a sqlx error, keeping unique violations distinct
pub(crate) fn map_db_error(context: &str, err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.code().map_or(false, |code| code == UNIQUE_VIOLATION) {
            return StoreError::Duplicate(db.constraint().unwrap_or("unique constraint").to_string());
        }
    }

    StoreError::Backend(format!("{}: {}", context, err))
}
