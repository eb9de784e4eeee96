//! Driven port for the remote application ledger.

use async_trait::async_trait;

use super::RemoteCallError;
use crate::domain::{Application, ApplicationSubmission, AuthToken, IdempotencyKey};

/// Port for submitting and listing the caller's applications.
///
/// The ledger is the sole authority on uniqueness and deadlines; it may
/// reject a submission the client considered valid.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationLedger: Send + Sync {
    /// Submit an application. `key` is identical across retries of the same
    /// draft.
    async fn submit(
        &self,
        token: &AuthToken,
        submission: &ApplicationSubmission,
        key: &IdempotencyKey,
    ) -> Result<Application, RemoteCallError>;

    /// List applications owned by the token holder.
    async fn my_applications(&self, token: &AuthToken) -> Result<Vec<Application>, RemoteCallError>;
}
