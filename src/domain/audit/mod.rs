// Audit trail domain module
// Append-only records of trust-relevant actions taken on agents

pub mod audit_log;

pub use audit_log::{actions, AuditLog, AuditOutcome, NewAuditEntry};
