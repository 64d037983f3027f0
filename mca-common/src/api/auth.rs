//! Shared-secret verification
//!
//! Every inbound request and every outbound callback carries a static
//! `secret_key` string. Inbound values are compared against the configured
//! secret; a mismatch is an authorization failure, never a crash.
//!
//! # Comparison
//!
//! Both sides are reduced to SHA-256 digests and the digests are compared
//! without early exit, so response timing does not depend on how many
//! leading characters of a guess were right.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Provided secret does not match the configured one
    #[error("Invalid secret key")]
    InvalidSecret,

    /// Configured secret is empty (refused at construction)
    #[error("Shared secret must not be empty")]
    EmptySecret,
}

/// Configured shared secret
///
/// `Debug` is redacted so the value never reaches logs.
#[derive(Clone)]
pub struct SharedSecret {
    value: String,
    digest: [u8; 32],
}

impl SharedSecret {
    /// Create a shared secret from its configured value
    ///
    /// # Examples
    ///
    /// ```
    /// use mca_common::api::auth::SharedSecret;
    ///
    /// let secret = SharedSecret::new("music_analysis_secret_2024").unwrap();
    /// assert!(secret.verify("music_analysis_secret_2024").is_ok());
    /// assert!(secret.verify("guess").is_err());
    /// assert!(SharedSecret::new("").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, AuthError> {
        let value = value.into();
        if value.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        let digest = digest_of(&value);
        Ok(Self { value, digest })
    }

    /// Check a caller-supplied secret
    pub fn verify(&self, provided: &str) -> Result<(), AuthError> {
        let provided = digest_of(provided);
        let diff = self
            .digest
            .iter()
            .zip(provided.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if diff == 0 {
            Ok(())
        } else {
            Err(AuthError::InvalidSecret)
        }
    }

    /// Raw value, for echoing back to the backend in result payloads
    pub fn expose(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

fn digest_of(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}
