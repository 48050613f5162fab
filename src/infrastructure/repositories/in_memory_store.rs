//! In-memory store implementing both repository traits
//!
//! Backs the `memory` storage backend and the integration tests. One write
//! lock covers each operation, so an agent update and its audit entry become
//! visible together or not at all.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::agent::{Agent, AgentStatus, AgentUpdate, NewAgent};
use crate::domain::audit::{AuditLog, NewAuditEntry};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::pagination::Page;
use crate::domain::repositories::{AgentFilter, AgentRepository, AuditLogRepository};

#[derive(Debug, Default)]
struct State {
    agents: HashMap<Uuid, Agent>,
    audit_logs: Vec<AuditLog>,
}

/// Shared in-memory store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    fail_audit_appends: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every audit append fail until switched off again
    ///
    /// Used to exercise rollback of writes that carry an audit entry.
    pub fn fail_audit_appends(&self, fail: bool) {
        self.fail_audit_appends.store(fail, AtomicOrdering::SeqCst);
    }

    fn check_audit_append(&self) -> StoreResult<()> {
        if self.fail_audit_appends.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Backend("audit log append failed".to_string()));
        }
        Ok(())
    }
}

fn newest_first(a: &Agent, b: &Agent) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| a.id().cmp(&b.id()))
}

fn window<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl AgentRepository for InMemoryStore {
    async fn insert(&self, agent: NewAgent) -> StoreResult<Agent> {
        let mut state = self.state.write().await;
        if state.agents.contains_key(&agent.id) {
            return Err(StoreError::Duplicate(format!("agent id {}", agent.id)));
        }

        let agent = Agent::from_new(agent, Utc::now());
        state.agents.insert(agent.id(), agent.clone());
        Ok(agent)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Agent>> {
        let state = self.state.read().await;
        Ok(state.agents.get(&id).cloned())
    }

    async fn list(&self, filter: &AgentFilter, page: Page) -> StoreResult<Vec<Agent>> {
        let state = self.state.read().await;
        let mut matching: Vec<Agent> = state
            .agents
            .values()
            .filter(|agent| filter.matches(agent))
            .cloned()
            .collect();
        matching.sort_by(newest_first);

        Ok(window(matching, page))
    }

    async fn count(&self, filter: &AgentFilter) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state.agents.values().filter(|agent| filter.matches(agent)).count() as u64)
    }

    async fn update_with_audit(
        &self,
        id: Uuid,
        expected_status: AgentStatus,
        update: AgentUpdate,
        entry: NewAuditEntry,
    ) -> StoreResult<(Agent, AuditLog)> {
        let mut state = self.state.write().await;

        let stored = state.agents.get(&id).ok_or(StoreError::AgentNotFound(id))?;
        if stored.status() != expected_status {
            return Err(StoreError::StaleWrite(id));
        }

        // Stage both writes; nothing is applied unless the audit append succeeds.
        let now = Utc::now();
        let mut updated = stored.clone();
        updated.apply(update);
        updated.touch(now);

        self.check_audit_append()?;
        if !state.agents.contains_key(&entry.agent_id) {
            return Err(StoreError::AgentNotFound(entry.agent_id));
        }
        let log = AuditLog::record(entry, now);

        state.agents.insert(id, updated.clone());
        state.audit_logs.push(log.clone());
        Ok((updated, log))
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryStore {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditLog> {
        let mut state = self.state.write().await;
        if !state.agents.contains_key(&entry.agent_id) {
            return Err(StoreError::AgentNotFound(entry.agent_id));
        }

        self.check_audit_append()?;
        let log = AuditLog::record(entry, Utc::now());
        state.audit_logs.push(log.clone());
        Ok(log)
    }

    async fn count_by_agent(&self, agent_id: Uuid) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .audit_logs
            .iter()
            .filter(|log| log.agent_id == agent_id)
            .count() as u64)
    }

    async fn find_by_agent(&self, agent_id: Uuid, page: Page) -> StoreResult<Vec<AuditLog>> {
        let state = self.state.read().await;
        // Appended in time order, so reversing yields newest first.
        let entries: Vec<AuditLog> = state
            .audit_logs
            .iter()
            .rev()
            .filter(|log| log.agent_id == agent_id)
            .cloned()
            .collect();

        Ok(window(entries, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{CreateAgentInput, Email, Metadata, OwnerBinding};
    use crate::domain::audit::{actions, AuditOutcome};

    fn new_agent(name: &str) -> NewAgent {
        NewAgent::new(CreateAgentInput {
            name: name.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn entry(agent_id: Uuid) -> NewAuditEntry {
        NewAuditEntry {
            agent_id,
            action: actions::STATUS_CHANGE.to_string(),
            resource: agent_id.to_string(),
            outcome: AuditOutcome::Allowed,
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn insert_stamps_timestamps() {
        let store = InMemoryStore::new();
        let agent = store.insert(new_agent("a")).await.unwrap();

        assert_eq!(agent.created_at(), agent.updated_at());
        assert_eq!(store.find_by_id(agent.id()).await.unwrap(), Some(agent));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = InMemoryStore::new();
        let agent = new_agent("a");

        store.insert(agent.clone()).await.unwrap();
        let result = store.insert(agent).await;

        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn append_requires_existing_agent() {
        let store = InMemoryStore::new();
        let missing = Uuid::new_v4();

        let result = store.append(entry(missing)).await;

        assert!(matches!(result, Err(StoreError::AgentNotFound(id)) if id == missing));
        assert_eq!(store.count_by_agent(missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_with_audit_rejects_stale_status() {
        let store = InMemoryStore::new();
        let agent = store.insert(new_agent("a")).await.unwrap();

        let result = store
            .update_with_audit(
                agent.id(),
                AgentStatus::Inactive,
                AgentUpdate::Status(AgentStatus::Suspended),
                entry(agent.id()),
            )
            .await;

        assert!(matches!(result, Err(StoreError::StaleWrite(_))));
        assert_eq!(store.count_by_agent(agent.id()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn status_update_keeps_owner_written_since_the_read() {
        let store = InMemoryStore::new();
        let agent = store.insert(new_agent("a")).await.unwrap();
        let binding = OwnerBinding::new(
            Uuid::new_v4(),
            Email::new("a@x.com").unwrap(),
            None,
            Utc::now(),
        );

        store
            .update_with_audit(
                agent.id(),
                AgentStatus::Active,
                AgentUpdate::Owner(binding.clone()),
                entry(agent.id()),
            )
            .await
            .unwrap();
        let (updated, _) = store
            .update_with_audit(
                agent.id(),
                AgentStatus::Active,
                AgentUpdate::Status(AgentStatus::Suspended),
                entry(agent.id()),
            )
            .await
            .unwrap();

        assert_eq!(updated.status(), AgentStatus::Suspended);
        assert_eq!(updated.owner(), Some(&binding));
    }

    #[tokio::test]
    async fn failed_audit_append_leaves_agent_untouched() {
        let store = InMemoryStore::new();
        let original = store.insert(new_agent("a")).await.unwrap();

        store.fail_audit_appends(true);
        let result = store
            .update_with_audit(
                original.id(),
                AgentStatus::Active,
                AgentUpdate::Status(AgentStatus::Inactive),
                entry(original.id()),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(store.find_by_id(original.id()).await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn audit_entry_for_unknown_agent_rolls_back_update() {
        let store = InMemoryStore::new();
        let original = store.insert(new_agent("a")).await.unwrap();

        let result = store
            .update_with_audit(
                original.id(),
                AgentStatus::Active,
                AgentUpdate::Status(AgentStatus::Revoked),
                entry(Uuid::new_v4()),
            )
            .await;

        assert!(matches!(result, Err(StoreError::AgentNotFound(_))));
        assert_eq!(store.find_by_id(original.id()).await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn audit_entries_list_newest_first() {
        let store = InMemoryStore::new();
        let agent = store.insert(new_agent("a")).await.unwrap();

        let first = store.append(entry(agent.id())).await.unwrap();
        let second = store.append(entry(agent.id())).await.unwrap();

        let listed = store.find_by_agent(agent.id(), Page::default()).await.unwrap();
        assert_eq!(listed, vec![second, first]);
    }
}
