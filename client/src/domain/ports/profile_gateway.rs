//! Driven port for the remote profile endpoints.

use async_trait::async_trait;

use super::RemoteCallError;
use crate::domain::{AuthToken, CandidateProfile, Identity, ProfileAsset, ProfileSnapshot};

/// Port for reading and updating the caller's profile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// Fetch the complete profile.
    async fn complete_profile(&self, token: &AuthToken) -> Result<ProfileSnapshot, RemoteCallError>;

    /// Replace the profile and return the refreshed identity.
    async fn update_profile(
        &self,
        token: &AuthToken,
        profile: &CandidateProfile,
    ) -> Result<Identity, RemoteCallError>;

    /// Delete the stored photo or resume.
    async fn delete_asset(&self, token: &AuthToken, asset: ProfileAsset) -> Result<(), RemoteCallError>;
}
