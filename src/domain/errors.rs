use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::agent::value_objects::AgentStatus;

/// A single field-level validation failure
///
/// `field` is the path of the offending input (e.g. `ownerEmail`, `tags[2]`)
/// so the transport layer can point the caller at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Agent not found: {0}")]
    NotFound(Uuid),

    #[error("Cannot {attempted} agent in {status} status")]
    InvalidStateTransition {
        status: AgentStatus,
        attempted: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store failure: {0}")]
    Store(String),
}

impl RegistryError {
    /// Shorthand for a validation error on a single field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        RegistryError::Validation(vec![FieldError::new(field, message)])
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by repository implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Agent not found: {0}")]
    AgentNotFound(Uuid),

    /// The row no longer carries the status the caller read before writing
    #[error("Agent {0} was modified concurrently")]
    StaleWrite(Uuid),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AgentNotFound(id) => RegistryError::NotFound(id),
            StoreError::StaleWrite(id) => RegistryError::Conflict(format!(
                "agent {} was modified concurrently, retry the operation",
                id
            )),
            StoreError::Duplicate(key) => RegistryError::Conflict(format!("duplicate key: {}", key)),
            StoreError::Backend(message) => RegistryError::Store(message),
        }
    }
}
