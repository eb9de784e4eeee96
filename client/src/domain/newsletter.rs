//! Newsletter sign-up.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::ports::NewsletterGateway;
use super::{Error, ErrorCode, is_plausible_email};

/// Subscribes addresses to the portal newsletter.
pub struct NewsletterService<N> {
    gateway: Arc<N>,
}

impl<N> NewsletterService<N> {
    /// Create a subscriber over `gateway`.
    pub const fn new(gateway: Arc<N>) -> Self {
        Self { gateway }
    }
}

impl<N> NewsletterService<N>
where
    N: NewsletterGateway,
{
    /// Subscribe `email` after checking its shape locally.
    pub async fn subscribe(&self, email: &str) -> Result<(), Error> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(Error::validation("Enter a valid email address")
                .with_details(json!({ "field": "email" })));
        }
        self.gateway
            .subscribe(email)
            .await
            .map_err(|error| error.to_domain_error(ErrorCode::Submit, "Subscription failed"))?;
        info!("newsletter subscription accepted");
        Ok(())
    }
}
