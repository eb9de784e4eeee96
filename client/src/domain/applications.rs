//! The signed-in applicant's own application list.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::ApplicationLedger;
use super::{Application, Error, ErrorCode, FetchOutcome, ReadRetry, SessionStore};

/// Reads the caller's applications from the ledger.
pub struct ApplicationsService<L> {
    ledger: Arc<L>,
    session: Arc<SessionStore>,
    retry: ReadRetry,
}

impl<L> ApplicationsService<L> {
    /// Create a reader over `ledger`.
    pub const fn new(ledger: Arc<L>, session: Arc<SessionStore>, retry: ReadRetry) -> Self {
        Self {
            ledger,
            session,
            retry,
        }
    }
}

impl<L> ApplicationsService<L>
where
    L: ApplicationLedger,
{
    /// Fetch every application owned by the signed-in user.
    ///
    /// Degrades to an empty list on failure. A rejected token forces a
    /// logout before the degraded result is returned.
    pub async fn my_applications(&self) -> FetchOutcome<Application> {
        let Some(token) = self.session.view().bearer_token() else {
            return FetchOutcome::degraded(Error::auth("Sign in to view your applications"));
        };
        let result = self
            .retry
            .run("my_applications", || self.ledger.my_applications(&token))
            .await;
        match result {
            Ok(items) => {
                debug!(count = items.len(), "applications fetched");
                FetchOutcome::ok(items)
            }
            Err(error) if self.session.expire_on_unauthorized(&error) => {
                FetchOutcome::degraded(error.to_domain_error(ErrorCode::Auth, "Session expired"))
            }
            Err(error) => {
                warn!(error = %error, "application list fetch failed; showing empty list");
                FetchOutcome::degraded(
                    error.to_domain_error(ErrorCode::Fetch, "Failed to load applications"),
                )
            }
        }
    }
}
