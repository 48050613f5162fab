pub mod auth;

pub use auth::{ApiKeyAuth, API_KEY_HEADER};
