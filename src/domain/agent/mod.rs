// Agent domain module
// Contains the agent aggregate root, value objects, and domain events

#![allow(clippy::module_inception)]

pub mod agent;
pub mod events;
pub mod value_objects;

// Re-export main types for convenience
pub use agent::{Agent, AgentUpdate, CreateAgentInput, NewAgent};
pub use events::AgentEvent;
pub use value_objects::{AgentStatus, Email, Metadata, OwnerBinding};
