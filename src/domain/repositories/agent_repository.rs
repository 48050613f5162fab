use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentStatus, AgentUpdate, NewAgent};
use crate::domain::audit::{AuditLog, NewAuditEntry};
use crate::domain::errors::StoreResult;
use crate::domain::pagination::Page;

/// Filter for agent enumeration; `None` fields match everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentFilter {
    pub status: Option<AgentStatus>,
    pub owner_id: Option<Uuid>,
}

impl AgentFilter {
    /// Returns true when `agent` satisfies every set criterion
    pub fn matches(&self, agent: &Agent) -> bool {
        self.status.map_or(true, |s| agent.status() == s)
            && self.owner_id.map_or(true, |o| agent.owner_id() == Some(o))
    }
}

/// Repository trait for the Agent aggregate
///
/// Listing order is `created_at` descending with ties broken by `id`
/// ascending, so consecutive pages never overlap or skip rows.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Persist a new agent, stamping `created_at`/`updated_at`
    async fn insert(&self, agent: NewAgent) -> StoreResult<Agent>;

    /// Find an agent by its ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Agent>>;

    /// One page of agents matching `filter`
    async fn list(&self, filter: &AgentFilter, page: Page) -> StoreResult<Vec<Agent>>;

    /// Number of agents matching `filter`, ignoring pagination
    async fn count(&self, filter: &AgentFilter) -> StoreResult<u64>;

    /// Apply `update` to agent `id` and append `entry` as one unit
    ///
    /// Only the fields named by `update` are written. The update only applies
    /// if the stored agent still has `expected_status`; otherwise
    /// `StoreError::StaleWrite` is returned. If the audit append fails, the
    /// agent update is rolled back. Returns the agent as stored afterwards.
    async fn update_with_audit(
        &self,
        id: Uuid,
        expected_status: AgentStatus,
        update: AgentUpdate,
        entry: NewAuditEntry,
    ) -> StoreResult<(Agent, AuditLog)>;
}
