use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::agent::value_objects::Metadata;

/// Well-known audit action tags
pub mod actions {
    /// An owner was bound (or re-bound) to an agent
    pub const OWNER_BIND: &str = "owner.bind";
    /// An agent moved between lifecycle statuses
    pub const STATUS_CHANGE: &str = "agent.status_change";
}

/// Result of the audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Allowed,
    Denied,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Allowed => "allowed",
            AuditOutcome::Denied => "denied",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allowed" => Ok(AuditOutcome::Allowed),
            "denied" => Ok(AuditOutcome::Denied),
            _ => Err(format!("Invalid audit outcome: {}", s)),
        }
    }
}

/// An audit entry waiting to be appended
///
/// The store assigns `id` and `created_at` when it persists the entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub agent_id: Uuid,
    pub action: String,
    pub resource: String,
    pub outcome: AuditOutcome,
    pub metadata: Metadata,
}

/// A persisted, immutable audit log entry
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLog {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub action: String,
    pub resource: String,
    pub outcome: AuditOutcome,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// Stamps a pending entry with its identity and insertion time
    pub fn record(entry: NewAuditEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: entry.agent_id,
            action: entry.action,
            resource: entry.resource,
            outcome: entry.outcome,
            metadata: entry.metadata,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_round_trips_through_str() {
        assert_eq!("allowed".parse::<AuditOutcome>(), Ok(AuditOutcome::Allowed));
        assert_eq!(AuditOutcome::Denied.to_string(), "denied");
        assert!("maybe".parse::<AuditOutcome>().is_err());
    }

    #[test]
    fn record_keeps_entry_fields() {
        let agent_id = Uuid::new_v4();
        let mut metadata = Metadata::new();
        metadata.insert("ownerEmail".into(), json!("a@x.com"));

        let now = Utc::now();
        let log = AuditLog::record(
            NewAuditEntry {
                agent_id,
                action: actions::OWNER_BIND.to_string(),
                resource: "a@x.com".to_string(),
                outcome: AuditOutcome::Allowed,
                metadata: metadata.clone(),
            },
            now,
        );

        assert_eq!(log.agent_id, agent_id);
        assert_eq!(log.action, "owner.bind");
        assert_eq!(log.outcome, AuditOutcome::Allowed);
        assert_eq!(log.metadata, metadata);
        assert_eq!(log.created_at, now);
    }
}
