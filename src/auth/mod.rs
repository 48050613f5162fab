// Authentication module
// API key issuance helpers and the verification capability used by the API layer

pub mod api_key;
pub mod verifier;

pub use api_key::{generate_api_key, hash_api_key};
pub use verifier::{ApiKeyVerifier, AuthError, PermissiveVerifier, Principal, StaticKeyVerifier};
