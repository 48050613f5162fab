use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::audit::{AuditLog, NewAuditEntry};
use crate::domain::errors::StoreResult;
use crate::domain::pagination::Page;

/// Repository trait for the append-only audit trail
///
/// There is deliberately no update or delete.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Append an entry; fails with `AgentNotFound` if the agent does not exist
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditLog>;

    /// Number of entries recorded for an agent
    async fn count_by_agent(&self, agent_id: Uuid) -> StoreResult<u64>;

    /// Entries for an agent, newest first
    async fn find_by_agent(&self, agent_id: Uuid, page: Page) -> StoreResult<Vec<AuditLog>>;
}
