use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::ApiKeyAuth;
use crate::api::responses::{ApiResponse, PaginatedResponse};
use crate::api::state::AppState;
use crate::domain::agent::{Agent, AgentStatus, CreateAgentInput, Metadata};
use crate::domain::audit::{AuditLog, AuditOutcome};
use crate::domain::errors::{FieldError, RegistryError};
use crate::registry::{self, AgentQuery, BindOwnerInput, RawAgentQuery};

/// Request body for registering an agent
///
/// Everything is optional here so a missing name reaches the registry's
/// validation and comes back as a field error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
    pub metadata: Option<Metadata>,
    pub tags: Option<Vec<String>>,
}

impl From<CreateAgentRequest> for CreateAgentInput {
    fn from(req: CreateAgentRequest) -> Self {
        Self {
            name: req.name.unwrap_or_default(),
            description: req.description,
            platform: req.platform,
            version: req.version,
            metadata: req.metadata,
            tags: req.tags,
        }
    }
}

/// Request body for binding an owner
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindOwnerRequest {
    pub owner_id: Option<String>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
}

impl From<BindOwnerRequest> for BindOwnerInput {
    fn from(req: BindOwnerRequest) -> Self {
        Self {
            owner_email: req.owner_email.unwrap_or_default(),
            owner_name: req.owner_name,
            owner_id: req.owner_id,
        }
    }
}

/// Request body for a status change
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: Option<String>,
}

/// Query string for agent listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAgentsParams {
    pub status: Option<String>,
    pub owner_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Query string for audit log listing
#[derive(Debug, Default, Deserialize)]
pub struct ListAuditLogsParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Agent as returned by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
    pub status: AgentStatus,
    pub owner_id: Option<Uuid>,
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub bound_at: Option<DateTime<Utc>>,
    pub metadata: Metadata,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl From<&Agent> for AgentResponse {
    fn from(agent: &Agent) -> Self {
        let owner = agent.owner();
        Self {
            id: agent.id(),
            name: agent.name().to_string(),
            description: agent.description().map(str::to_string),
            platform: agent.platform().map(str::to_string),
            version: agent.version().map(str::to_string),
            status: agent.status(),
            owner_id: owner.map(|o| o.owner_id()),
            owner_email: owner.map(|o| o.owner_email().to_string()),
            owner_name: owner.and_then(|o| o.owner_name().map(str::to_string)),
            bound_at: owner.map(|o| o.bound_at()),
            metadata: agent.metadata().clone(),
            tags: agent.tags().to_vec(),
            created_at: agent.created_at(),
            updated_at: agent.updated_at(),
            last_seen_at: agent.last_seen_at(),
        }
    }
}

/// Agent plus the size of its audit trail
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDetailResponse {
    #[serde(flatten)]
    pub agent: AgentResponse,
    pub audit_log_count: u64,
}

/// Audit entry as returned by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub action: String,
    pub resource: String,
    pub outcome: AuditOutcome,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl From<&AuditLog> for AuditLogResponse {
    fn from(log: &AuditLog) -> Self {
        Self {
            id: log.id,
            agent_id: log.agent_id,
            action: log.action.clone(),
            resource: log.resource.clone(),
            outcome: log.outcome,
            metadata: log.metadata.clone(),
            created_at: log.created_at,
        }
    }
}

fn agent_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::validation(vec![FieldError::new("id", "must be a valid UUID")]))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Register a new agent
///
/// POST /v1/agents
pub async fn create_agent(
    State(state): State<AppState>,
    ApiKeyAuth(_principal): ApiKeyAuth,
    payload: Result<Json<CreateAgentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AgentResponse>>), ApiError> {
    let req = body(payload)?;
    let agent = registry::create_agent(state.agents.as_ref(), req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AgentResponse::from(&agent))),
    ))
}

/// List agents with optional filters
///
/// GET /v1/agents?status=&ownerId=&limit=&offset=
pub async fn list_agents(
    State(state): State<AppState>,
    ApiKeyAuth(_principal): ApiKeyAuth,
    params: Result<Query<ListAgentsParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<AgentResponse>>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let query = AgentQuery::parse(&RawAgentQuery {
        status: params.status,
        owner_id: params.owner_id,
        limit: params.limit,
        offset: params.offset,
    })?;

    let page = registry::list_agents(state.agents.as_ref(), &query).await?;
    let data = page.agents.iter().map(AgentResponse::from).collect();

    Ok(Json(PaginatedResponse::new(
        data,
        page.total,
        page.limit,
        page.offset,
    )))
}

/// Get an agent by ID, including its audit log count
///
/// GET /v1/agents/:id
pub async fn get_agent(
    State(state): State<AppState>,
    ApiKeyAuth(_principal): ApiKeyAuth,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<AgentDetailResponse>>, ApiError> {
    let id = agent_id(path)?;
    let detail = registry::get_agent(state.agents.as_ref(), state.audit_logs.as_ref(), id).await?;

    Ok(Json(ApiResponse::ok(AgentDetailResponse {
        agent: AgentResponse::from(&detail.agent),
        audit_log_count: detail.audit_log_count,
    })))
}

/// Bind a human owner to an agent
///
/// POST /v1/agents/:id/owner
pub async fn bind_owner(
    State(state): State<AppState>,
    ApiKeyAuth(_principal): ApiKeyAuth,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<BindOwnerRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AgentResponse>>, ApiError> {
    let id = agent_id(path)?;
    let req = body(payload)?;

    let outcome = registry::bind_owner(state.agents.as_ref(), id, req.into()).await?;

    Ok(Json(ApiResponse::with_message(
        AgentResponse::from(&outcome.agent),
        outcome.message,
    )))
}

/// Move an agent to another lifecycle status
///
/// PATCH /v1/agents/:id/status
pub async fn change_status(
    State(state): State<AppState>,
    ApiKeyAuth(_principal): ApiKeyAuth,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AgentResponse>>, ApiError> {
    let id = agent_id(path)?;
    let req = body(payload)?;

    let next: AgentStatus = req
        .status
        .as_deref()
        .ok_or_else(|| RegistryError::invalid_field("status", "is required"))?
        .parse::<AgentStatus>()
        .map_err(|e: String| RegistryError::invalid_field("status", e))?;

    let change = registry::change_status(state.agents.as_ref(), id, next).await?;

    Ok(Json(ApiResponse::ok(AgentResponse::from(&change.agent))))
}

/// List an agent's audit trail, newest first
///
/// GET /v1/agents/:id/audit-logs?limit=&offset=
pub async fn list_audit_logs(
    State(state): State<AppState>,
    ApiKeyAuth(_principal): ApiKeyAuth,
    path: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<ListAuditLogsParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<AuditLogResponse>>, ApiError> {
    let id = agent_id(path)?;
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let page = registry::parse_page(&params.limit, &params.offset)?;

    let audit = registry::list_audit_logs(state.agents.as_ref(), state.audit_logs.as_ref(), id, page).await?;
    let data = audit.entries.iter().map(AuditLogResponse::from).collect();

    Ok(Json(PaginatedResponse::new(
        data,
        audit.total,
        audit.limit,
        audit.offset,
    )))
}
