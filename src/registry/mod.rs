//! Registry operations
//!
//! Each operation takes the repositories it needs as explicit arguments, so
//! callers (HTTP handlers, tests, other services) choose the backing store.
//! Failures are returned, never logged here.

pub mod agents;
pub mod audit;
pub mod binding;
pub mod query;

pub use agents::{change_status, create_agent, get_agent, AgentDetail, StatusChange};
pub use audit::{list_audit_logs, AuditPage};
pub use binding::{bind_owner, BindOwnerInput, BindOwnerOutcome};
pub use query::{list_agents, parse_page, AgentPage, AgentQuery, RawAgentQuery};
