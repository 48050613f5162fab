use uuid::Uuid;

use crate::domain::agent::{Agent, AgentStatus};
use crate::domain::errors::{FieldError, RegistryError, RegistryResult};
use crate::domain::pagination::Page;
use crate::domain::repositories::{AgentFilter, AgentRepository};

/// Unparsed listing parameters, as they arrive from a query string
#[derive(Debug, Clone, Default)]
pub struct RawAgentQuery {
    pub status: Option<String>,
    pub owner_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// A parsed listing request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentQuery {
    pub filter: AgentFilter,
    pub page: Page,
}

impl AgentQuery {
    pub fn new(filter: AgentFilter, limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            filter,
            page: Page::new(limit, offset),
        }
    }

    /// Parses raw parameters, collecting every malformed value
    ///
    /// Empty strings are treated as absent.
    pub fn parse(raw: &RawAgentQuery) -> RegistryResult<Self> {
        let mut errors = Vec::new();

        let status = non_empty(&raw.status).and_then(|s| {
            s.parse::<AgentStatus>()
                .map_err(|e| errors.push(FieldError::new("status", e)))
                .ok()
        });
        let owner_id = non_empty(&raw.owner_id).and_then(|s| {
            Uuid::parse_str(s)
                .map_err(|_| errors.push(FieldError::new("ownerId", "must be a valid UUID")))
                .ok()
        });
        let limit = parse_integer("limit", &raw.limit, &mut errors);
        let offset = parse_integer("offset", &raw.offset, &mut errors);

        if !errors.is_empty() {
            return Err(RegistryError::Validation(errors));
        }

        Ok(Self::new(AgentFilter { status, owner_id }, limit, offset))
    }
}

/// Parses a bare limit/offset pair into a clamped page
pub fn parse_page(limit: &Option<String>, offset: &Option<String>) -> RegistryResult<Page> {
    let mut errors = Vec::new();
    let limit = parse_integer("limit", limit, &mut errors);
    let offset = parse_integer("offset", offset, &mut errors);

    if !errors.is_empty() {
        return Err(RegistryError::Validation(errors));
    }
    Ok(Page::new(limit, offset))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_integer(field: &str, value: &Option<String>, errors: &mut Vec<FieldError>) -> Option<i64> {
    non_empty(value).and_then(|s| {
        s.parse::<i64>()
            .map_err(|_| errors.push(FieldError::new(field, "must be an integer")))
            .ok()
    })
}

/// One page of agents plus the unpaginated match count
#[derive(Debug, Clone)]
pub struct AgentPage {
    pub agents: Vec<Agent>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

/// Lists agents newest first; `limit` in the result reflects clamping
pub async fn list_agents(agents: &dyn AgentRepository, query: &AgentQuery) -> RegistryResult<AgentPage> {
    let page = agents.list(&query.filter, query.page).await?;
    let total = agents.count(&query.filter).await?;

    Ok(AgentPage {
        agents: page,
        total,
        limit: query.page.limit(),
        offset: query.page.offset(),
    })
}
