use chrono::Utc;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentUpdate, Email, OwnerBinding};
use crate::domain::audit::AuditLog;
use crate::domain::errors::{FieldError, RegistryError, RegistryResult};
use crate::domain::repositories::AgentRepository;

/// Caller-supplied owner identity
#[derive(Debug, Clone, Default)]
pub struct BindOwnerInput {
    pub owner_email: String,
    pub owner_name: Option<String>,
    /// Must be a UUID when present; generated otherwise
    pub owner_id: Option<String>,
}

/// Result of a successful binding
#[derive(Debug, Clone)]
pub struct BindOwnerOutcome {
    pub agent: Agent,
    pub audit_entry: AuditLog,
    pub message: String,
}

/// Binds a human owner to an agent and records an `owner.bind` audit entry
///
/// # Behavior
/// - Fails with `Validation` on a malformed email or owner id
/// - Fails with `NotFound` if the agent does not exist
/// - Fails with `InvalidStateTransition` if the agent is REVOKED
/// - Overwrites any existing binding; `bound_at` moves to now
///
/// The agent update and the audit entry are written as one unit: if the
/// audit append fails, the binding is not visible to later reads.
///
/// Repeating a bind converges to the same owner fields but appends one audit
/// entry per call. When no owner id is supplied and the agent is already
/// bound to the same email, the existing owner id is kept.
pub async fn bind_owner(
    agents: &dyn AgentRepository,
    agent_id: Uuid,
    input: BindOwnerInput,
) -> RegistryResult<BindOwnerOutcome> {
    let (owner_email, requested_owner_id) = validate(&input)?;

    let mut agent = agents
        .find_by_id(agent_id)
        .await?
        .ok_or(RegistryError::NotFound(agent_id))?;

    let owner_id = requested_owner_id
        .or_else(|| {
            agent
                .owner()
                .filter(|current| current.owner_email() == &owner_email)
                .map(OwnerBinding::owner_id)
        })
        .unwrap_or_else(Uuid::new_v4);

    let binding = OwnerBinding::new(owner_id, owner_email, input.owner_name, Utc::now());
    let observed = agent.status();
    let event = agent.bind_owner(binding.clone())?;

    let (agent, audit_entry) = agents
        .update_with_audit(
            agent_id,
            observed,
            AgentUpdate::Owner(binding),
            event.to_audit_entry(),
        )
        .await?;

    let message = format!(
        "Agent \"{}\" bound to owner {}",
        agent.name(),
        audit_entry.resource
    );
    tracing::info!(agent_id = %agent_id, owner_id = %owner_id, "owner bound to agent");

    Ok(BindOwnerOutcome {
        agent,
        audit_entry,
        message,
    })
}

fn validate(input: &BindOwnerInput) -> RegistryResult<(Email, Option<Uuid>)> {
    let mut errors = Vec::new();

    let email = Email::new(input.owner_email.as_str())
        .map_err(|_| errors.push(FieldError::new("ownerEmail", "must be a valid email address")))
        .ok();

    let owner_id = match input.owner_id.as_deref() {
        None => None,
        Some(raw) => Uuid::parse_str(raw)
            .map_err(|_| errors.push(FieldError::new("ownerId", "must be a valid UUID")))
            .ok(),
    };

    match email {
        Some(email) if errors.is_empty() => Ok((email, owner_id)),
        _ => Err(RegistryError::Validation(errors)),
    }
}
