use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Free-form metadata attached to agents and audit entries
///
/// Passed through untouched; the registry never interprets its contents.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Lifecycle status of an agent
///
/// # Status Transitions
/// ```text
/// ACTIVE <-> INACTIVE <-> SUSPENDED <-> ACTIVE
///    \           |           /
///     +------> REVOKED <----+     (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    /// Agent is registered and allowed to operate
    Active,
    /// Agent is dormant
    Inactive,
    /// Agent is temporarily blocked
    Suspended,
    /// Agent is permanently retired
    Revoked,
}

impl AgentStatus {
    /// Checks if a transition from the current status to `next` is valid
    ///
    /// Nothing leaves `Revoked`. Every other pair is allowed, including
    /// moving into `Revoked` and re-entering the current status.
    ///
    /// # Example
    /// ```
    /// use agentshield_api::domain::agent::value_objects::AgentStatus;
    ///
    /// assert!(AgentStatus::Active.can_transition_to(AgentStatus::Suspended));
    /// assert!(!AgentStatus::Revoked.can_transition_to(AgentStatus::Active));
    /// ```
    pub fn can_transition_to(&self, _next: AgentStatus) -> bool {
        !self.is_terminal()
    }

    /// Returns true for statuses that accept no further changes
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Revoked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "ACTIVE",
            AgentStatus::Inactive => "INACTIVE",
            AgentStatus::Suspended => "SUSPENDED",
            AgentStatus::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(AgentStatus::Active),
            "INACTIVE" => Ok(AgentStatus::Inactive),
            "SUSPENDED" => Ok(AgentStatus::Suspended),
            "REVOKED" => Ok(AgentStatus::Revoked),
            _ => Err(format!(
                "Invalid agent status: {} (expected ACTIVE, INACTIVE, SUSPENDED or REVOKED)",
                s
            )),
        }
    }
}

/// Email value object
///
/// # Invariants
/// - Exactly one '@' with a non-empty local part
/// - Domain contains a '.' that is neither its first nor last character
/// - No whitespace, at most 254 characters
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use agentshield_api::domain::agent::value_objects::Email;
    ///
    /// let email = Email::new("owner@example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "owner@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
            return false;
        }

        let mut parts = email.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };

        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains("..")
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// The owner identity bound to an agent
///
/// Owner id, email and bind time travel together, so an agent either has
/// all three or none of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerBinding {
    owner_id: Uuid,
    owner_email: Email,
    owner_name: Option<String>,
    bound_at: DateTime<Utc>,
}

impl OwnerBinding {
    pub fn new(
        owner_id: Uuid,
        owner_email: Email,
        owner_name: Option<String>,
        bound_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            owner_email,
            owner_name,
            bound_at,
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn owner_email(&self) -> &Email {
        &self.owner_email
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    pub fn bound_at(&self) -> DateTime<Utc> {
        self.bound_at
    }

    /// True when both bindings name the same owner, ignoring bind time
    pub fn same_owner(&self, other: &OwnerBinding) -> bool {
        self.owner_id == other.owner_id
            && self.owner_email == other.owner_email
            && self.owner_name == other.owner_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_inactive_suspended_are_interchangeable() {
        use AgentStatus::*;
        for from in [Active, Inactive, Suspended] {
            for to in [Active, Inactive, Suspended] {
                assert!(from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn any_live_status_can_be_revoked() {
        assert!(AgentStatus::Active.can_transition_to(AgentStatus::Revoked));
        assert!(AgentStatus::Inactive.can_transition_to(AgentStatus::Revoked));
        assert!(AgentStatus::Suspended.can_transition_to(AgentStatus::Revoked));
    }

    #[test]
    fn revoked_is_terminal() {
        use AgentStatus::*;
        for to in [Active, Inactive, Suspended, Revoked] {
            assert!(!Revoked.can_transition_to(to));
        }
        assert!(Revoked.is_terminal());
        assert!(!Active.is_terminal());
    }

    #[test]
    fn status_display_and_parse() {
        assert_eq!(AgentStatus::Active.to_string(), "ACTIVE");
        assert_eq!(AgentStatus::Suspended.to_string(), "SUSPENDED");
        assert_eq!("REVOKED".parse::<AgentStatus>(), Ok(AgentStatus::Revoked));
        assert_eq!("inactive".parse::<AgentStatus>(), Ok(AgentStatus::Inactive));
        assert!("DELETED".parse::<AgentStatus>().is_err());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&AgentStatus::Inactive).unwrap();
        assert_eq!(json, "\"INACTIVE\"");
    }

    #[test]
    fn valid_emails() {
        assert!(Email::new("owner@example.com").is_ok());
        assert!(Email::new("first.last+tag@mail.example.co").is_ok());
        assert!(Email::new("a@x.com").is_ok());
    }

    #[test]
    fn invalid_emails() {
        assert!(Email::new("").is_err());
        assert!(Email::new("invalid").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("owner@").is_err());
        assert!(Email::new("owner@localhost").is_err());
        assert!(Email::new("owner@@example.com").is_err());
        assert!(Email::new("a@b@example.com").is_err());
        assert!(Email::new("owner@.example.com").is_err());
        assert!(Email::new("owner@example..com").is_err());
        assert!(Email::new("own er@example.com").is_err());
    }

    #[test]
    fn email_deserialization_validates() {
        let ok: Result<Email, _> = serde_json::from_str("\"a@x.com\"");
        assert!(ok.is_ok());

        let bad: Result<Email, _> = serde_json::from_str("\"not-an-email\"");
        assert!(bad.is_err());
    }

    #[test]
    fn same_owner_ignores_bind_time() {
        let owner_id = Uuid::new_v4();
        let email = Email::new("a@x.com").unwrap();
        let first = OwnerBinding::new(owner_id, email.clone(), None, Utc::now());
        let second = OwnerBinding::new(
            owner_id,
            email,
            None,
            Utc::now() + chrono::Duration::seconds(5),
        );

        assert!(first.same_owner(&second));
        assert_ne!(first, second);
    }
}
