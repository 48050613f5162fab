// Repository interfaces (ports)
// Implemented by adapters in the infrastructure layer

pub mod agent_repository;
pub mod audit_log_repository;

pub use agent_repository::{AgentFilter, AgentRepository};
pub use audit_log_repository::AuditLogRepository;
