use uuid::Uuid;

use crate::domain::audit::{AuditLog, NewAuditEntry};
use crate::domain::errors::{FieldError, RegistryError, RegistryResult};
use crate::domain::pagination::Page;
use crate::domain::repositories::{AgentRepository, AuditLogRepository};

/// Appends a standalone entry to an agent's audit trail
///
/// Entries produced by agent state changes are written by the operation
/// that made the change; this is for actions recorded on their own.
pub async fn append(audit_logs: &dyn AuditLogRepository, entry: NewAuditEntry) -> RegistryResult<AuditLog> {
    if entry.action.trim().is_empty() {
        return Err(RegistryError::Validation(vec![FieldError::new(
            "action",
            "must not be empty",
        )]));
    }

    Ok(audit_logs.append(entry).await?)
}

/// Number of audit entries recorded for an agent
pub async fn count_by_agent(audit_logs: &dyn AuditLogRepository, agent_id: Uuid) -> RegistryResult<u64> {
    Ok(audit_logs.count_by_agent(agent_id).await?)
}

/// One page of an agent's audit trail, newest first
#[derive(Debug, Clone)]
pub struct AuditPage {
    pub entries: Vec<AuditLog>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

/// Lists audit entries for an existing agent
pub async fn list_audit_logs(
    agents: &dyn AgentRepository,
    audit_logs: &dyn AuditLogRepository,
    agent_id: Uuid,
    page: Page,
) -> RegistryResult<AuditPage> {
    if agents.find_by_id(agent_id).await?.is_none() {
        return Err(RegistryError::NotFound(agent_id));
    }

    let entries = audit_logs.find_by_agent(agent_id, page).await?;
    let total = audit_logs.count_by_agent(agent_id).await?;

    Ok(AuditPage {
        entries,
        total,
        limit: page.limit(),
        offset: page.offset(),
    })
}
