//! Driven port for durable client-side credential storage.
//!
//! Two entries are kept: `token` holds the raw bearer token and `user` the
//! serialised identity snapshot. Either may be absent when storage was
//! written by an interrupted or foreign client.

use std::fmt;

use zeroize::Zeroizing;

use super::define_port_error;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the identity snapshot.
pub const USER_KEY: &str = "user";

/// Raw entries read from storage.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    /// Raw bearer token.
    pub token: Option<Zeroizing<String>>,
    /// Serialised identity JSON.
    pub user: Option<String>,
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

define_port_error! {
    /// Errors raised by credential storage.
    pub enum CredentialStoreError {
        /// The backing medium could not be read or written.
        Io { message: String } => "credential storage I/O failed: {message}",
        /// Stored bytes were not valid text.
        Corrupt { message: String } => "credential storage is corrupt: {message}",
    }
}

/// Port for persisting the session across restarts.
///
/// Implementations are synchronous; entries are small and written rarely.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// Read both entries.
    fn load(&self) -> Result<StoredCredentials, CredentialStoreError>;

    /// Write both entries, replacing any previous values.
    fn save(&self, token: &str, user_json: &str) -> Result<(), CredentialStoreError>;

    /// Remove both entries. Removing absent entries succeeds.
    fn clear(&self) -> Result<(), CredentialStoreError>;
}
