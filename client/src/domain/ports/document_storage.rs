//! Driven port for the remote object store.

use async_trait::async_trait;

use super::RemoteCallError;
use crate::domain::{AuthToken, DocumentReference, UploadContext, UploadFile};

/// Port for streaming a file to storage.
///
/// Holds no state between calls. Size and type rules are enforced by the
/// caller before the port is reached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Upload `file` for `context` and return a durable reference.
    async fn upload(
        &self,
        token: &AuthToken,
        file: &UploadFile,
        context: &UploadContext,
    ) -> Result<DocumentReference, RemoteCallError>;
}
