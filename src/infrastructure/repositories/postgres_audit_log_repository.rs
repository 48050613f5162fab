use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use super::map_db_error;
use crate::domain::agent::Metadata;
use crate::domain::audit::{AuditLog, NewAuditEntry};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::pagination::Page;
use crate::domain::repositories::AuditLogRepository;

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: Uuid,
    agent_id: Uuid,
    action: String,
    resource: String,
    outcome: String,
    metadata: Json<Metadata>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLog {
    type Error = StoreError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let outcome = row
            .outcome
            .parse()
            .map_err(|e| StoreError::Backend(format!("Invalid audit row {}: {}", row.id, e)))?;

        Ok(AuditLog {
            id: row.id,
            agent_id: row.agent_id,
            action: row.action,
            resource: row.resource,
            outcome,
            metadata: row.metadata.0,
            created_at: row.created_at,
        })
    }
}

/// Inserts one audit row using whatever executor the caller holds
///
/// Shared with the agent repository so an agent update and its audit entry
/// can run on the same transaction.
pub(crate) async fn insert_audit_log<'e, E>(executor: E, entry: NewAuditEntry) -> StoreResult<AuditLog>
where
    E: PgExecutor<'e>,
{
    let agent_id = entry.agent_id;
    let row = sqlx::query_as::<_, AuditLogRow>(
        r#"
        INSERT INTO audit_logs (id, agent_id, action, resource, outcome, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING id, agent_id, action, resource, outcome, metadata, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.agent_id)
    .bind(entry.action)
    .bind(entry.resource)
    .bind(entry.outcome.as_str())
    .bind(Json(entry.metadata))
    .fetch_one(executor)
    .await
    .map_err(|e| {
        let missing_agent = e
            .as_database_error()
            .and_then(|db| db.code())
            .map_or(false, |code| code == FOREIGN_KEY_VIOLATION);
        if missing_agent {
            StoreError::AgentNotFound(agent_id)
        } else {
            map_db_error("Failed to append audit log", e)
        }
    })?;

    row.try_into()
}

/// PostgreSQL implementation of AuditLogRepository
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a new PostgresAuditLogRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditLog> {
        insert_audit_log(&self.pool, entry).await
    }

    async fn count_by_agent(&self, agent_id: Uuid) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE agent_id = $1")
            .bind(agent_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("Failed to count audit logs", e))?;

        Ok(count.max(0) as u64)
    }

    async fn find_by_agent(&self, agent_id: Uuid, page: Page) -> StoreResult<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, agent_id, action, resource, outcome, metadata, created_at
            FROM audit_logs
            WHERE agent_id = $1
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(agent_id)
        .bind(i64::from(page.limit()))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("Failed to find audit logs by agent", e))?;

        rows.into_iter().map(AuditLog::try_from).collect()
    }
}
