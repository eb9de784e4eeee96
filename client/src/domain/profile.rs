//! Candidate profile: read, update, and attached photo/resume assets.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::ports::{DocumentStorage, ProfileGateway, RemoteCallError};
use super::{
    AuthToken, CandidateProfile, DocumentReference, Error, ErrorCode, Identity, ReadRetry,
    SessionStore, UploadContext, UploadFile, check_upload, rejection_to_error,
};

/// File attached to a profile rather than to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAsset {
    /// Profile photo.
    Photo,
    /// Curriculum vitae.
    Resume,
}

impl ProfileAsset {
    /// Remote path for upload and deletion.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Photo => "/api/profile/photo",
            Self::Resume => "/api/profile/resume",
        }
    }

    /// Multipart field carrying the file, and response field carrying its URL.
    pub const fn field(self) -> &'static str {
        match self {
            Self::Photo => "profilePhoto",
            Self::Resume => "resume",
        }
    }

    /// Upload rules for this asset.
    pub const fn upload_context(self) -> UploadContext {
        match self {
            Self::Photo => UploadContext::ProfilePhoto,
            Self::Resume => UploadContext::Resume,
        }
    }
}

/// Complete profile with asset URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    /// Editable profile fields.
    #[serde(flatten)]
    pub profile: CandidateProfile,
    /// Stored photo, if any.
    #[serde(default, rename = "profilePhoto")]
    pub profile_photo_url: Option<String>,
    /// Stored resume, if any.
    #[serde(default, rename = "resume")]
    pub resume_url: Option<String>,
}

/// Profile reads and writes on behalf of the signed-in user.
pub struct ProfileService<P, D> {
    gateway: Arc<P>,
    storage: Arc<D>,
    session: Arc<SessionStore>,
    retry: ReadRetry,
}

impl<P, D> ProfileService<P, D> {
    /// Create a profile service.
    pub const fn new(
        gateway: Arc<P>,
        storage: Arc<D>,
        session: Arc<SessionStore>,
        retry: ReadRetry,
    ) -> Self {
        Self {
            gateway,
            storage,
            session,
            retry,
        }
    }

    fn token(&self) -> Result<AuthToken, Error> {
        self.session
            .view()
            .bearer_token()
            .ok_or_else(|| Error::auth("Sign in to manage your profile"))
    }

    fn fail(&self, error: &RemoteCallError, code: ErrorCode, fallback: &str) -> Error {
        self.session.expire_on_unauthorized(error);
        error.to_domain_error(code, fallback)
    }
}

impl<P, D> ProfileService<P, D>
where
    P: ProfileGateway,
    D: DocumentStorage,
{
    /// Fetch the complete profile.
    pub async fn complete_profile(&self) -> Result<ProfileSnapshot, Error> {
        let token = self.token()?;
        self.retry
            .run("complete_profile", || self.gateway.complete_profile(&token))
            .await
            .map_err(|error| self.fail(&error, ErrorCode::Fetch, "Failed to load profile"))
    }

    /// Replace the profile. `skills_csv` is split on commas first.
    ///
    /// The returned identity also replaces the session identity.
    pub async fn update_profile(
        &self,
        profile: &CandidateProfile,
        skills_csv: Option<&str>,
    ) -> Result<Identity, Error> {
        let token = self.token()?;
        let mut profile = profile.clone();
        if let Some(raw) = skills_csv {
            profile.set_skills_from_csv(raw);
        }
        let identity = self
            .gateway
            .update_profile(&token, &profile)
            .await
            .map_err(|error| match error {
                RemoteCallError::FieldErrors { .. } => {
                    self.fail(&error, ErrorCode::Validation, "Failed to update profile")
                }
                _ => self.fail(&error, ErrorCode::Submit, "Failed to update profile"),
            })?;
        info!(user_id = %identity.id, "profile updated");
        self.session.refresh_identity(identity.clone());
        Ok(identity)
    }

    /// Upload a profile photo or resume.
    ///
    /// Size and type are checked before any remote call. A new photo URL is
    /// copied into the session identity.
    pub async fn upload_asset(
        &self,
        asset: ProfileAsset,
        file: &UploadFile,
    ) -> Result<DocumentReference, Error> {
        let context = asset.upload_context();
        check_upload(&context, file)
            .map_err(|rejection| rejection_to_error(&context, file, &rejection))?;
        let token = self.token()?;
        let reference = self
            .storage
            .upload(&token, file, &context)
            .await
            .map_err(|error| {
                let fallback = format!("Failed to upload {}", file.file_name);
                self.fail(&error, ErrorCode::Upload, &fallback)
            })?;
        if asset == ProfileAsset::Photo {
            if let Some(mut identity) = self.session.view().identity() {
                identity.profile_photo_url = Some(reference.url.clone());
                self.session.refresh_identity(identity);
            }
        }
        info!(asset = asset.field(), "profile asset uploaded");
        Ok(reference)
    }

    /// Delete the stored photo or resume.
    pub async fn delete_asset(&self, asset: ProfileAsset) -> Result<(), Error> {
        let token = self.token()?;
        self.gateway
            .delete_asset(&token, asset)
            .await
            .map_err(|error| self.fail(&error, ErrorCode::Submit, "Failed to delete file"))?;
        if asset == ProfileAsset::Photo {
            if let Some(mut identity) = self.session.view().identity() {
                identity.profile_photo_url = None;
                self.session.refresh_identity(identity);
            }
        }
        info!(asset = asset.field(), "profile asset deleted");
        Ok(())
    }
}
