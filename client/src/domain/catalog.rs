//! Opportunity catalogue: degraded-tolerant fetch and category filtering.

use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::OpportunitySource;
use super::{CategoryFilter, Error, ErrorCode, Opportunity, ReadRetry, SessionStore};

/// Result of a read that degrades to an empty list on failure.
///
/// `error` is set when `items` is empty because the read failed, so a
/// presentation layer can offer a retry.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    /// Items read, or nothing after a failure.
    pub items: Vec<T>,
    /// Failure that caused the degradation.
    pub error: Option<Error>,
}

impl<T> FetchOutcome<T> {
    /// Successful read.
    pub const fn ok(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    /// Failed read, degraded to empty.
    pub const fn degraded(error: Error) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error),
        }
    }

    /// Whether the read failed.
    pub const fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Keep listings matching `filter`, preserving source order.
///
/// [`CategoryFilter::All`] returns the input unchanged.
pub fn filter_by_category(all: &[Opportunity], filter: CategoryFilter) -> Vec<Opportunity> {
    match filter {
        CategoryFilter::All => all.to_vec(),
        CategoryFilter::Only(category) => all
            .iter()
            .filter(|opportunity| opportunity.category == category)
            .cloned()
            .collect(),
    }
}

/// Reads the published catalogue.
pub struct CatalogService<S> {
    source: Arc<S>,
    session: Arc<SessionStore>,
    retry: ReadRetry,
}

impl<S> CatalogService<S> {
    /// Create a catalogue reader.
    pub const fn new(source: Arc<S>, session: Arc<SessionStore>, retry: ReadRetry) -> Self {
        Self {
            source,
            session,
            retry,
        }
    }
}

impl<S> CatalogService<S>
where
    S: OpportunitySource,
{
    /// Fetch every listing, sending the bearer token when signed in.
    ///
    /// Never fails: a network or decode failure yields an empty list with
    /// [`ErrorCode::Fetch`] attached.
    pub async fn fetch_opportunities(&self) -> FetchOutcome<Opportunity> {
        let token = self.session.view().bearer_token();
        let result = self
            .retry
            .run("list_opportunities", || {
                self.source.list_opportunities(token.as_ref())
            })
            .await;
        match result {
            Ok(items) => {
                debug!(count = items.len(), "catalogue fetched");
                FetchOutcome::ok(items)
            }
            Err(error) => {
                self.session.expire_on_unauthorized(&error);
                warn!(error = %error, "catalogue fetch failed; showing empty list");
                FetchOutcome::degraded(
                    error.to_domain_error(ErrorCode::Fetch, "Failed to load opportunities"),
                )
            }
        }
    }
}
