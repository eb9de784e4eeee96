//! Driven port for the remote authentication endpoints.

use async_trait::async_trait;

use super::RemoteCallError;
use crate::domain::{AuthSession, AuthToken, Identity, LoginCredentials, Registration};

/// Port for logging in, registering, and verifying bearer tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for an identity and token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, RemoteCallError>;

    /// Create an account from a validated registration.
    async fn register(&self, registration: &Registration) -> Result<AuthSession, RemoteCallError>;

    /// Ask the remote whether `token` is still accepted.
    ///
    /// Returns [`RemoteCallError::Unauthorized`] when it is not.
    async fn verify(&self, token: &AuthToken) -> Result<Identity, RemoteCallError>;
}
