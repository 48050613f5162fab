use super::events::AgentEvent;
use super::value_objects::{AgentStatus, Metadata, OwnerBinding};
use crate::domain::errors::{FieldError, RegistryError, RegistryResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum length of an agent name, in characters
pub const MAX_NAME_LENGTH: usize = 255;

/// Caller-supplied fields for registering an agent
#[derive(Debug, Clone, Default)]
pub struct CreateAgentInput {
    pub name: String,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
    pub metadata: Option<Metadata>,
    pub tags: Option<Vec<String>>,
}

/// A validated agent that has not been persisted yet
///
/// The store turns this into an [`Agent`] by stamping `created_at` and
/// `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAgent {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
    pub status: AgentStatus,
    pub metadata: Metadata,
    pub tags: Vec<String>,
}

impl NewAgent {
    /// Validates registration input and assigns a fresh id
    ///
    /// # Business Rules Enforced
    /// - Name must not be blank and is at most 255 characters
    /// - Tags must not be blank; duplicates are collapsed
    /// - Initial status is always Active
    /// - Optional fields are copied verbatim
    pub fn new(input: CreateAgentInput) -> RegistryResult<Self> {
        let mut errors = Vec::new();

        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        } else if input.name.chars().count() > MAX_NAME_LENGTH {
            errors.push(FieldError::new(
                "name",
                format!("must be at most {} characters", MAX_NAME_LENGTH),
            ));
        }

        let mut tags: Vec<String> = Vec::new();
        for (i, tag) in input.tags.unwrap_or_default().into_iter().enumerate() {
            if tag.trim().is_empty() {
                errors.push(FieldError::new(format!("tags[{}]", i), "must not be empty"));
            } else if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        if !errors.is_empty() {
            return Err(RegistryError::Validation(errors));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            platform: input.platform,
            version: input.version,
            status: AgentStatus::Active,
            metadata: input.metadata.unwrap_or_default(),
            tags,
        })
    }
}

/// The fields one guarded store write changes
///
/// Stores apply only these columns and leave every other field at its
/// stored value, so two writers touching different fields never undo each
/// other.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentUpdate {
    Owner(OwnerBinding),
    Status(AgentStatus),
}

/// Agent aggregate root
///
/// Represents a registered software agent and the human accountable for it.
///
/// # Invariants
/// - `id` never changes
/// - Owner fields are set together through [`OwnerBinding`]
/// - Nothing changes once the agent is Revoked
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    id: Uuid,
    name: String,
    description: Option<String>,
    platform: Option<String>,
    version: Option<String>,
    status: AgentStatus,
    owner: Option<OwnerBinding>,
    metadata: Metadata,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_seen_at: Option<DateTime<Utc>>,
}

impl Agent {
    /// Materializes a freshly inserted agent
    pub fn from_new(agent: NewAgent, created_at: DateTime<Utc>) -> Self {
        Self {
            id: agent.id,
            name: agent.name,
            description: agent.description,
            platform: agent.platform,
            version: agent.version,
            status: agent.status,
            owner: None,
            metadata: agent.metadata,
            tags: agent.tags,
            created_at,
            updated_at: created_at,
            last_seen_at: None,
        }
    }

    /// Binds an owner, replacing any previous binding
    ///
    /// # Returns
    /// * `Ok(AgentEvent::OwnerBound)` - the event to audit
    /// * `Err(RegistryError::InvalidStateTransition)` - if the agent is Revoked
    pub fn bind_owner(&mut self, binding: OwnerBinding) -> RegistryResult<AgentEvent> {
        if self.status.is_terminal() {
            return Err(RegistryError::InvalidStateTransition {
                status: self.status,
                attempted: "bind an owner to".to_string(),
            });
        }

        let event = AgentEvent::OwnerBound {
            agent_id: self.id,
            owner_id: binding.owner_id(),
            owner_email: binding.owner_email().to_string(),
            owner_name: binding.owner_name().map(str::to_string),
        };
        self.owner = Some(binding);

        Ok(event)
    }

    /// Moves the agent to `next`
    ///
    /// # Returns
    /// * `Ok(AgentEvent::StatusChanged)` - the event to audit
    /// * `Err(RegistryError::InvalidStateTransition)` - if the move is not allowed
    pub fn transition_to(&mut self, next: AgentStatus) -> RegistryResult<AgentEvent> {
        if !self.status.can_transition_to(next) {
            return Err(RegistryError::InvalidStateTransition {
                status: self.status,
                attempted: format!("move to {}", next),
            });
        }

        let from = self.status;
        self.status = next;

        Ok(AgentEvent::StatusChanged {
            agent_id: self.id,
            from,
            to: next,
        })
    }

    /// Writes `update` without checking the state machine
    ///
    /// Only to be used by repository implementations, after the caller
    /// validated the change with [`Agent::bind_owner`] or [`Agent::transition_to`].
    pub fn apply(&mut self, update: AgentUpdate) {
        match update {
            AgentUpdate::Owner(binding) => self.owner = Some(binding),
            AgentUpdate::Status(status) => self.status = status,
        }
    }

    /// Records the time the store persisted the latest change
    pub fn touch(&mut self, updated_at: DateTime<Utc>) {
        self.updated_at = updated_at;
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the current owner binding, if any
    pub fn owner(&self) -> Option<&OwnerBinding> {
        self.owner.as_ref()
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner.as_ref().map(OwnerBinding::owner_id)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Last liveness ping; reserved, nothing in the registry sets it yet
    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen_at
    }

    /// Reconstructs an Agent from persistence layer data
    ///
    /// Bypasses validation since the data was validated before it was stored.
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        name: String,
        description: Option<String>,
        platform: Option<String>,
        version: Option<String>,
        status: AgentStatus,
        owner: Option<OwnerBinding>,
        metadata: Metadata,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        last_seen_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            platform,
            version,
            status,
            owner,
            metadata,
            tags,
            created_at,
            updated_at,
            last_seen_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::value_objects::Email;
    use serde_json::json;

    fn input(name: &str) -> CreateAgentInput {
        CreateAgentInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn registered(name: &str) -> Agent {
        Agent::from_new(NewAgent::new(input(name)).unwrap(), Utc::now())
    }

    fn binding(email: &str) -> OwnerBinding {
        OwnerBinding::new(Uuid::new_v4(), Email::new(email).unwrap(), None, Utc::now())
    }

    #[test]
    fn new_agent_defaults() {
        let agent = NewAgent::new(input("scraper")).unwrap();

        assert_eq!(agent.name, "scraper");
        assert_eq!(agent.status, AgentStatus::Active);
        assert!(agent.tags.is_empty());
        assert!(agent.metadata.is_empty());
    }

    #[test]
    fn new_agent_copies_optional_fields() {
        let mut metadata = Metadata::new();
        metadata.insert("model".into(), json!({"family": "x", "ctx": 200000}));

        let agent = NewAgent::new(CreateAgentInput {
            name: "planner".into(),
            description: Some("plans things".into()),
            platform: Some("linux".into()),
            version: Some("1.2.3".into()),
            metadata: Some(metadata.clone()),
            tags: Some(vec!["prod".into(), "eu".into()]),
        })
        .unwrap();

        assert_eq!(agent.description.as_deref(), Some("plans things"));
        assert_eq!(agent.platform.as_deref(), Some("linux"));
        assert_eq!(agent.version.as_deref(), Some("1.2.3"));
        assert_eq!(agent.metadata, metadata);
        assert_eq!(agent.tags, vec!["prod".to_string(), "eu".to_string()]);
    }

    #[test]
    fn new_agent_ids_are_unique() {
        let a = NewAgent::new(input("a")).unwrap();
        let b = NewAgent::new(input("a")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn blank_name_fails() {
        for name in ["", "   "] {
            match NewAgent::new(input(name)) {
                Err(RegistryError::Validation(fields)) => assert_eq!(fields[0].field, "name"),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn name_length_is_counted_in_characters() {
        assert!(NewAgent::new(input(&"é".repeat(MAX_NAME_LENGTH))).is_ok());
        assert!(NewAgent::new(input(&"a".repeat(MAX_NAME_LENGTH + 1))).is_err());
    }

    #[test]
    fn duplicate_tags_collapse_and_blank_tags_fail() {
        let agent = NewAgent::new(CreateAgentInput {
            name: "a".into(),
            tags: Some(vec!["x".into(), "y".into(), "x".into()]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(agent.tags, vec!["x".to_string(), "y".to_string()]);

        match NewAgent::new(CreateAgentInput {
            name: "a".into(),
            tags: Some(vec!["x".into(), " ".into()]),
            ..Default::default()
        }) {
            Err(RegistryError::Validation(fields)) => assert_eq!(fields[0].field, "tags[1]"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn bind_owner_sets_all_owner_fields() {
        let mut agent = registered("a");
        let b = binding("a@x.com");

        let event = agent.bind_owner(b.clone()).unwrap();

        assert_eq!(agent.owner(), Some(&b));
        assert_eq!(agent.owner_id(), Some(b.owner_id()));
        assert!(matches!(event, AgentEvent::OwnerBound { owner_email, .. } if owner_email == "a@x.com"));
    }

    #[test]
    fn rebinding_replaces_owner() {
        let mut agent = registered("a");
        agent.bind_owner(binding("a@x.com")).unwrap();
        agent.bind_owner(binding("b@x.com")).unwrap();

        assert_eq!(agent.owner().unwrap().owner_email().as_str(), "b@x.com");
    }

    #[test]
    fn apply_touches_only_the_named_fields() {
        let mut agent = registered("a");
        let b = binding("a@x.com");

        agent.apply(AgentUpdate::Owner(b.clone()));
        agent.apply(AgentUpdate::Status(AgentStatus::Suspended));

        assert_eq!(agent.owner(), Some(&b));
        assert_eq!(agent.status(), AgentStatus::Suspended);

        agent.apply(AgentUpdate::Status(AgentStatus::Active));
        assert_eq!(agent.owner(), Some(&b), "status writes keep the owner");
    }

    #[test]
    fn revoked_agent_rejects_binding() {
        let mut agent = registered("a");
        agent.transition_to(AgentStatus::Revoked).unwrap();

        let result = agent.bind_owner(binding("a@x.com"));

        assert!(matches!(
            result,
            Err(RegistryError::InvalidStateTransition { status: AgentStatus::Revoked, .. })
        ));
        assert!(agent.owner().is_none());
    }

    #[test]
    fn transition_records_from_and_to() {
        let mut agent = registered("a");

        let event = agent.transition_to(AgentStatus::Suspended).unwrap();

        assert_eq!(agent.status(), AgentStatus::Suspended);
        assert_eq!(
            event,
            AgentEvent::StatusChanged {
                agent_id: agent.id(),
                from: AgentStatus::Active,
                to: AgentStatus::Suspended,
            }
        );
    }

    #[test]
    fn revoked_agent_rejects_transitions() {
        let mut agent = registered("a");
        agent.transition_to(AgentStatus::Revoked).unwrap();

        assert!(agent.transition_to(AgentStatus::Active).is_err());
        assert_eq!(agent.status(), AgentStatus::Revoked);
    }
}
