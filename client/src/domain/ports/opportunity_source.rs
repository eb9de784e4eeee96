//! Driven port for reading the published opportunity list.

use async_trait::async_trait;

use super::RemoteCallError;
use crate::domain::{AuthToken, Opportunity};

/// Port for listing opportunities.
///
/// Implementations normalise whatever envelope the remote returns into a
/// flat list in response order; an unrecognisable body is
/// [`RemoteCallError::Decode`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunitySource: Send + Sync {
    /// Fetch every published opportunity.
    async fn list_opportunities<'a>(
        &self,
        token: Option<&'a AuthToken>,
    ) -> Result<Vec<Opportunity>, RemoteCallError>;
}
