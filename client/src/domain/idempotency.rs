//! Submission idempotency key.
//!
//! One key is minted per composer and sent in the `Idempotency-Key` header
//! of every submission attempt it makes, so the ledger can collapse a retry
//! after an ambiguous failure into the original request.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// HTTP header carrying the key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Rejected textual key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdempotencyKeyValidationError {
    /// Nothing but whitespace.
    #[error("idempotency key must not be empty")]
    EmptyKey,
    /// Not a UUID in any accepted form.
    #[error("idempotency key `{0}` is not a UUID")]
    InvalidKey(String),
}

/// UUID sent with application submissions, held in hyphenated lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Parse a key persisted by the host, such as one kept across a restart.
    ///
    /// Surrounding whitespace is ignored. Braced, simple, and URN forms are
    /// accepted and normalised to the hyphenated form.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyKeyValidationError`] for blank or non-UUID input.
    ///
    /// ```
    /// # use portal_client::domain::IdempotencyKey;
    /// let key = IdempotencyKey::new("{550E8400-E29B-41D4-A716-446655440000}")
    ///     .expect("valid UUID");
    /// assert_eq!(key.as_ref(), "550e8400-e29b-41d4-a716-446655440000");
    /// ```
    pub fn new(raw: &str) -> Result<Self, IdempotencyKeyValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        Uuid::try_parse(trimmed)
            .map(|uuid| Self(uuid.hyphenated().to_string()))
            .map_err(|_| IdempotencyKeyValidationError::InvalidKey(trimmed.to_owned()))
    }

    /// Mint a fresh v4 key.
    pub fn random() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
