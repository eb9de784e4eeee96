//! Driven port for newsletter subscriptions.

use async_trait::async_trait;

use super::RemoteCallError;

/// Port for subscribing an address to the newsletter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsletterGateway: Send + Sync {
    /// Subscribe `email`. Unauthenticated.
    async fn subscribe(&self, email: &str) -> Result<(), RemoteCallError>;
}
