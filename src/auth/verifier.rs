use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use super::api_key::hash_api_key;

/// The caller identity behind a verified API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
}

/// Error types for API key verification
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing API key")]
    MissingKey,
    #[error("Invalid API key")]
    InvalidKey,
}

/// Turns a presented API key into a verified principal
#[async_trait]
pub trait ApiKeyVerifier: Send + Sync {
    async fn verify(&self, key: &str) -> Result<Principal, AuthError>;
}

/// Accepts any non-empty key
///
/// Development only: the key itself becomes the principal id.
#[derive(Debug, Default, Clone)]
pub struct PermissiveVerifier;

#[async_trait]
impl ApiKeyVerifier for PermissiveVerifier {
    async fn verify(&self, key: &str) -> Result<Principal, AuthError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AuthError::MissingKey);
        }

        Ok(Principal { id: key.to_string() })
    }
}

/// Accepts keys whose SHA-256 digest is in a fixed set
#[derive(Debug, Default, Clone)]
pub struct StaticKeyVerifier {
    key_hashes: HashSet<String>,
}

impl StaticKeyVerifier {
    /// Builds a verifier from hex digests produced by [`hash_api_key`]
    pub fn new<I, S>(key_hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_hashes: key_hashes
                .into_iter()
                .map(|h| h.into().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn key_count(&self) -> usize {
        self.key_hashes.len()
    }
}

#[async_trait]
impl ApiKeyVerifier for StaticKeyVerifier {
    async fn verify(&self, key: &str) -> Result<Principal, AuthError> {
        if key.trim().is_empty() {
            return Err(AuthError::MissingKey);
        }

        let hash = hash_api_key(key);
        if !self.key_hashes.contains(&hash) {
            return Err(AuthError::InvalidKey);
        }

        Ok(Principal {
            id: format!("key:{}", &hash[..12]),
        })
    }
}
