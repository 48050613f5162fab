use std::sync::Arc;

use crate::auth::ApiKeyVerifier;
use crate::domain::repositories::{AgentRepository, AuditLogRepository};
use crate::infrastructure::repositories::InMemoryStore;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub agents: Arc<dyn AgentRepository>,
    pub audit_logs: Arc<dyn AuditLogRepository>,
    pub verifier: Arc<dyn ApiKeyVerifier>,
}

impl AppState {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        audit_logs: Arc<dyn AuditLogRepository>,
        verifier: Arc<dyn ApiKeyVerifier>,
    ) -> Self {
        Self {
            agents,
            audit_logs,
            verifier,
        }
    }

    /// State backed by a single in-memory store
    pub fn in_memory(store: InMemoryStore, verifier: Arc<dyn ApiKeyVerifier>) -> Self {
        Self::new(Arc::new(store.clone()), Arc::new(store), verifier)
    }
}
