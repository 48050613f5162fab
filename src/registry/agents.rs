use uuid::Uuid;

use super::audit;

use crate::domain::agent::{Agent, AgentStatus, AgentUpdate, CreateAgentInput, NewAgent};
use crate::domain::audit::AuditLog;
use crate::domain::errors::{RegistryError, RegistryResult};
use crate::domain::repositories::{AgentRepository, AuditLogRepository};

/// An agent together with the size of its audit trail
#[derive(Debug, Clone)]
pub struct AgentDetail {
    pub agent: Agent,
    pub audit_log_count: u64,
}

/// Outcome of a status change
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub agent: Agent,
    pub audit_entry: AuditLog,
}

/// Registers a new agent in the ACTIVE status
///
/// Input is validated here even when a transport-level validator already
/// ran, so the operation is safe to call directly.
pub async fn create_agent(
    agents: &dyn AgentRepository,
    input: CreateAgentInput,
) -> RegistryResult<Agent> {
    let new_agent = NewAgent::new(input)?;
    let agent = agents.insert(new_agent).await?;

    tracing::info!(agent_id = %agent.id(), name = agent.name(), "agent registered");
    Ok(agent)
}

/// Loads an agent and counts its audit entries
pub async fn get_agent(
    agents: &dyn AgentRepository,
    audit_logs: &dyn AuditLogRepository,
    id: Uuid,
) -> RegistryResult<AgentDetail> {
    let agent = agents
        .find_by_id(id)
        .await?
        .ok_or(RegistryError::NotFound(id))?;
    let audit_log_count = audit::count_by_agent(audit_logs, id).await?;

    Ok(AgentDetail {
        agent,
        audit_log_count,
    })
}

/// Moves an agent to `next` and audits the move in the same unit of work
///
/// Every status change is audited, including re-entering the current status.
pub async fn change_status(
    agents: &dyn AgentRepository,
    id: Uuid,
    next: AgentStatus,
) -> RegistryResult<StatusChange> {
    let mut agent = agents
        .find_by_id(id)
        .await?
        .ok_or(RegistryError::NotFound(id))?;

    let observed = agent.status();
    let event = agent.transition_to(next)?;
    let (agent, audit_entry) = agents
        .update_with_audit(id, observed, AgentUpdate::Status(next), event.to_audit_entry())
        .await?;

    tracing::info!(agent_id = %id, from = %observed, to = %next, "agent status changed");
    Ok(StatusChange { agent, audit_entry })
}
