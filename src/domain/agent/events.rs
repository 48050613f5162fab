use serde_json::json;
use uuid::Uuid;

use super::value_objects::{AgentStatus, Metadata};
use crate::domain::audit::{actions, AuditOutcome, NewAuditEntry};

/// Domain events raised by the Agent aggregate
///
/// Every event is trust-relevant and is persisted as an audit entry in the
/// same unit of work as the state change that produced it.
///
/// # Example
/// ```
/// use agentshield_api::domain::agent::events::AgentEvent;
/// use agentshield_api::domain::agent::value_objects::AgentStatus;
/// use uuid::Uuid;
///
/// let event = AgentEvent::StatusChanged {
///     agent_id: Uuid::new_v4(),
///     from: AgentStatus::Active,
///     to: AgentStatus::Suspended,
/// };
/// assert_eq!(event.to_audit_entry().action, "agent.status_change");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Fired when an owner is bound to an agent
    OwnerBound {
        agent_id: Uuid,
        owner_id: Uuid,
        owner_email: String,
        owner_name: Option<String>,
    },
    /// Fired when an agent changes lifecycle status
    StatusChanged {
        agent_id: Uuid,
        from: AgentStatus,
        to: AgentStatus,
    },
}

impl AgentEvent {
    /// Returns the agent_id for this event
    pub fn agent_id(&self) -> Uuid {
        match self {
            AgentEvent::OwnerBound { agent_id, .. } => *agent_id,
            AgentEvent::StatusChanged { agent_id, .. } => *agent_id,
        }
    }

    /// Builds the audit entry that records this event
    pub fn to_audit_entry(&self) -> NewAuditEntry {
        match self {
            AgentEvent::OwnerBound {
                agent_id,
                owner_id,
                owner_email,
                owner_name,
            } => NewAuditEntry {
                agent_id: *agent_id,
                action: actions::OWNER_BIND.to_string(),
                resource: owner_email.clone(),
                outcome: AuditOutcome::Allowed,
                metadata: object(json!({
                    "ownerId": owner_id,
                    "ownerEmail": owner_email,
                    "ownerName": owner_name,
                })),
            },
            AgentEvent::StatusChanged { agent_id, from, to } => NewAuditEntry {
                agent_id: *agent_id,
                action: actions::STATUS_CHANGE.to_string(),
                resource: agent_id.to_string(),
                outcome: AuditOutcome::Allowed,
                metadata: object(json!({
                    "from": from,
                    "to": to,
                })),
            },
        }
    }
}

fn object(value: serde_json::Value) -> Metadata {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_bound_audit_entry() {
        let agent_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let event = AgentEvent::OwnerBound {
            agent_id,
            owner_id,
            owner_email: "a@x.com".to_string(),
            owner_name: Some("Ada".to_string()),
        };

        let entry = event.to_audit_entry();

        assert_eq!(event.agent_id(), agent_id);
        assert_eq!(entry.agent_id, agent_id);
        assert_eq!(entry.action, "owner.bind");
        assert_eq!(entry.resource, "a@x.com");
        assert_eq!(entry.outcome, AuditOutcome::Allowed);
        assert_eq!(entry.metadata["ownerId"], json!(owner_id.to_string()));
        assert_eq!(entry.metadata["ownerEmail"], json!("a@x.com"));
        assert_eq!(entry.metadata["ownerName"], json!("Ada"));
    }

    #[test]
    fn owner_bound_without_name_records_null() {
        let event = AgentEvent::OwnerBound {
            agent_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_email: "a@x.com".to_string(),
            owner_name: None,
        };

        assert_eq!(event.to_audit_entry().metadata["ownerName"], serde_json::Value::Null);
    }

    #[test]
    fn status_changed_audit_entry() {
        let agent_id = Uuid::new_v4();
        let event = AgentEvent::StatusChanged {
            agent_id,
            from: AgentStatus::Active,
            to: AgentStatus::Revoked,
        };

        let entry = event.to_audit_entry();

        assert_eq!(entry.action, "agent.status_change");
        assert_eq!(entry.resource, agent_id.to_string());
        assert_eq!(entry.metadata["from"], json!("ACTIVE"));
        assert_eq!(entry.metadata["to"], json!("REVOKED"));
    }
}
