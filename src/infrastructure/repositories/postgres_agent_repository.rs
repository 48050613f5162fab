use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::map_db_error;
use super::postgres_audit_log_repository::insert_audit_log;
use crate::domain::agent::{Agent, AgentStatus, AgentUpdate, Email, Metadata, NewAgent, OwnerBinding};
use crate::domain::audit::{AuditLog, NewAuditEntry};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::pagination::Page;
use crate::domain::repositories::{AgentFilter, AgentRepository};

const AGENT_COLUMNS: &str = r#"
    id, name, description, platform, version, status,
    owner_id, owner_email, owner_name, bound_at,
    metadata, tags, created_at, updated_at, last_seen_at
"#;

#[derive(Debug, FromRow)]
struct AgentRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    platform: Option<String>,
    version: Option<String>,
    status: String,
    owner_id: Option<Uuid>,
    owner_email: Option<String>,
    owner_name: Option<String>,
    bound_at: Option<DateTime<Utc>>,
    metadata: Json<Metadata>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_seen_at: Option<DateTime<Utc>>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = StoreError;

    fn try_from(r: AgentRow) -> Result<Self, Self::Error> {
        let invalid = |what: String| StoreError::Backend(format!("Invalid agent row {}: {}", r.id, what));

        let status: AgentStatus = r.status.parse().map_err(invalid)?;
        let owner = match (r.owner_id, r.owner_email, r.bound_at) {
            (Some(owner_id), Some(email), Some(bound_at)) => Some(OwnerBinding::new(
                owner_id,
                Email::new(email).map_err(invalid)?,
                r.owner_name,
                bound_at,
            )),
            _ => None,
        };

        Ok(Agent::from_persistence(
            r.id,
            r.name,
            r.description,
            r.platform,
            r.version,
            status,
            owner,
            r.metadata.0,
            r.tags,
            r.created_at,
            r.updated_at,
            r.last_seen_at,
        ))
    }
}

/// PostgreSQL implementation of AgentRepository
///
/// Queries are built at runtime with `query_as`, so building the crate does
/// not need a reachable database.
pub struct PostgresAgentRepository {
    pool: PgPool,
}

impl PostgresAgentRepository {
    /// Creates a new PostgresAgentRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for PostgresAgentRepository {
    async fn insert(&self, agent: NewAgent) -> StoreResult<Agent> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            INSERT INTO agents (
                id, name, description, platform, version, status,
                metadata, tags, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), now())
            RETURNING {AGENT_COLUMNS}
            "#
        ))
        .bind(agent.id)
        .bind(agent.name)
        .bind(agent.description)
        .bind(agent.platform)
        .bind(agent.version)
        .bind(agent.status.as_str())
        .bind(Json(agent.metadata))
        .bind(agent.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to insert agent", e))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Agent>> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find agent by id", e))?;

        row.map(Agent::try_from).transpose()
    }

    async fn list(&self, filter: &AgentFilter, page: Page) -> StoreResult<Vec<Agent>> {
        let rows = sqlx::query_as::<_, AgentRow>(&format!(
            r#"
            SELECT {AGENT_COLUMNS}
            FROM agents
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR owner_id = $2)
            ORDER BY created_at DESC, id ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.owner_id)
        .bind(i64::from(page.limit()))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to list agents", e))?;

        rows.into_iter().map(Agent::try_from).collect()
    }

    async fn count(&self, filter: &AgentFilter) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM agents
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR owner_id = $2)
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to count agents", e))?;

        Ok(count.max(0) as u64)
    }

    async fn update_with_audit(
        &self,
        id: Uuid,
        expected_status: AgentStatus,
        update: AgentUpdate,
        entry: NewAuditEntry,
    ) -> StoreResult<(Agent, AuditLog)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        // Each statement sets only its own columns; the status guard is
        // re-evaluated against the latest row version once a concurrent
        // writer's lock is released.
        let row = match update {
            AgentUpdate::Owner(binding) => {
                sqlx::query_as::<_, AgentRow>(&format!(
                    r#"
                    UPDATE agents SET
                        owner_id = $2,
                        owner_email = $3,
                        owner_name = $4,
                        bound_at = $5,
                        updated_at = now()
                    WHERE id = $1 AND status = $6
                    RETURNING {AGENT_COLUMNS}
                    "#
                ))
                .bind(id)
                .bind(binding.owner_id())
                .bind(binding.owner_email().as_str())
                .bind(binding.owner_name())
                .bind(binding.bound_at())
                .bind(expected_status.as_str())
                .fetch_optional(&mut *tx)
                .await
            }
            AgentUpdate::Status(status) => {
                sqlx::query_as::<_, AgentRow>(&format!(
                    r#"
                    UPDATE agents SET
                        status = $2,
                        updated_at = now()
                    WHERE id = $1 AND status = $3
                    RETURNING {AGENT_COLUMNS}
                    "#
                ))
                .bind(id)
                .bind(status.as_str())
                .bind(expected_status.as_str())
                .fetch_optional(&mut *tx)
                .await
            }
        }
        .map_err(|e| map_db_error("Failed to update agent", e))?;

        // Dropping `tx` on any early return rolls the update back.
        let Some(row) = row else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM agents WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_db_error("Failed to check agent existence", e))?;

            return Err(if exists {
                StoreError::StaleWrite(id)
            } else {
                StoreError::AgentNotFound(id)
            });
        };

        let log = insert_audit_log(&mut *tx, entry).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit transaction", e))?;

        Ok((row.try_into()?, log))
    }
}
