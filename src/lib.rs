//! AgentShield API Library
//!
//! Registry of software agents, the human owners accountable for them, and
//! an append-only audit trail of trust-relevant actions.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod registry;
