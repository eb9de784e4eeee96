//! Authenticated identity, bearer token, and login credentials.
//!
//! The token is opaque: the client never decodes, inspects, or refreshes it.
//! It stays valid only for as long as the remote verification endpoint
//! accepts it.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::registration::is_plausible_email;

/// Validation errors for identity primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    /// Identifier was empty or padded with whitespace.
    InvalidId,
    /// Bearer token was blank.
    EmptyToken,
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email did not look like an address.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "identity id must be a non-empty, unpadded string"),
            Self::EmptyToken => write!(f, "authentication token must not be empty"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email is invalid"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Remote-assigned identifier of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

impl IdentityId {
    /// Validate and construct an [`IdentityId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let id = id.into();
        if id.is_empty() || id.trim() != id {
            return Err(IdentityValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for IdentityId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IdentityId> for String {
    fn from(value: IdentityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdentityId {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Access role carried by an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Student account.
    #[default]
    Standard,
    /// Back-office account.
    Administrative,
}

/// Snapshot of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Account identifier.
    pub id: IdentityId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Access role.
    pub role: Role,
    /// Retrieval URL of the profile photo, when one is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
}

impl Identity {
    /// Name shown in navigation and greetings.
    ///
    /// Falls back to the email when both name parts are blank.
    pub fn display_name(&self) -> String {
        let joined = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            self.email.clone()
        } else {
            trimmed.to_owned()
        }
    }

    /// Whether the identity may open administrative views.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrative
    }
}

/// Opaque bearer token issued by the remote service.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
    /// Wrap a raw token string.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(IdentityValidationError::EmptyToken);
        }
        Ok(Self(Zeroizing::new(raw)))
    }

    /// Raw token for the `Authorization` header or durable storage.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Identity paired with the token that authenticates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Authenticated user.
    pub identity: Identity,
    /// Bearer token for authenticated calls.
    pub token: AuthToken,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed, non-empty, and shaped like an address.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use portal_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" thandi@example.com ", "secret1").unwrap();
/// assert_eq!(creds.email(), "thandi@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, IdentityValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(IdentityValidationError::EmptyEmail);
        }
        if !is_plausible_email(normalized) {
            return Err(IdentityValidationError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(IdentityValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used as the login name.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
