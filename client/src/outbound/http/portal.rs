//! Reqwest-backed adapter for every remote port.
//!
//! Owns transport details only: request building, bearer headers, timeout
//! and status mapping, and decoding into domain types.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use tracing::debug;

use super::dto::{
    LoginRequestDto, NewsletterRequestDto, RegisterRequestDto, decode_application,
    decode_asset_url, decode_auth, decode_identity, decode_my_applications, decode_opportunities,
    decode_profile, decode_upload,
};
use super::envelope::{CatalogEnvelope, normalise};
use super::errors::{map_status_error, map_transport_error};
use crate::domain::ports::{
    ApplicationLedger, AuthGateway, DocumentStorage, NewsletterGateway, OpportunitySource,
    ProfileGateway, RemoteCallError,
};
use crate::domain::{
    Application, ApplicationSubmission, AuthSession, AuthToken, CandidateProfile,
    DocumentReference, IDEMPOTENCY_KEY_HEADER, IdempotencyKey, Identity, LoginCredentials,
    Opportunity, ProfileAsset, ProfileSnapshot, Registration, UploadContext, UploadFile,
};

const LOGIN_PATH: &str = "api/auth/login";
const REGISTER_PATH: &str = "api/auth/register";
const VERIFY_PATH: &str = "api/auth/verify";
const OPPORTUNITIES_PATH: &str = "api/opportunities";
const NEWSLETTER_PATH: &str = "api/newsletter/subscribe";
const DOCUMENT_UPLOAD_PATH: &str = "api/uploads/documents";
const APPLICATIONS_PATH: &str = "api/applications";
const MY_APPLICATIONS_PATH: &str = "api/applications/my-applications";
const COMPLETE_PROFILE_PATH: &str = "api/profile/complete";
const PROFILE_PATH: &str = "api/profile";

/// HTTP client for the portal API rooted at one base URL.
#[derive(Clone)]
pub struct HttpPortal {
    client: Client,
    base: Url,
    clock: Arc<dyn Clock>,
}

impl HttpPortal {
    /// Build an adapter whose every request is bounded by `timeout`.
    ///
    /// A base URL with a path prefix keeps it; endpoint paths are resolved
    /// relative to it.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let mut base = base;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base,
            clock: Arc::new(DefaultClock),
        })
    }

    /// Replace the clock used to stamp upload times.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Base URL requests are resolved against.
    pub const fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteCallError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|error| RemoteCallError::invalid_request(format!("{path}: {error}")))
    }

    /// Send `request` and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, RemoteCallError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let url = response.url().path().to_owned();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(status = status.as_u16(), path = %url, bytes = body.len(), "remote call finished");
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }

    fn file_part(file: &UploadFile) -> Result<Part, RemoteCallError> {
        Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|error| {
                RemoteCallError::invalid_request(format!("{}: {error}", file.file_name))
            })
    }

    async fn upload_profile_asset(
        &self,
        token: &AuthToken,
        file: &UploadFile,
        asset: ProfileAsset,
    ) -> Result<DocumentReference, RemoteCallError> {
        let form = Form::new().part(asset.field(), Self::file_part(file)?);
        let body = self
            .send(
                self.client
                    .post(self.endpoint(asset.path())?)
                    .bearer_auth(token.expose())
                    .multipart(form),
            )
            .await?;
        Ok(DocumentReference {
            name: file.file_name.clone(),
            storage_key: None,
            url: decode_asset_url(&body, asset.field())?,
            uploaded_at: self.clock.utc(),
        })
    }
}

#[async_trait]
impl AuthGateway for HttpPortal {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, RemoteCallError> {
        let body = self
            .send(self.client.post(self.endpoint(LOGIN_PATH)?).json(&LoginRequestDto {
                email: credentials.email(),
                password: credentials.password(),
            }))
            .await?;
        decode_auth(&body)
    }

    async fn register(&self, registration: &Registration) -> Result<AuthSession, RemoteCallError> {
        let body = self
            .send(
                self.client
                    .post(self.endpoint(REGISTER_PATH)?)
                    .json(&RegisterRequestDto {
                        profile: &registration.profile,
                        password: registration.password(),
                    }),
            )
            .await?;
        decode_auth(&body)
    }

    async fn verify(&self, token: &AuthToken) -> Result<Identity, RemoteCallError> {
        let body = self
            .send(
                self.client
                    .get(self.endpoint(VERIFY_PATH)?)
                    .bearer_auth(token.expose()),
            )
            .await?;
        decode_identity(&body)
    }
}

#[async_trait]
impl OpportunitySource for HttpPortal {
    async fn list_opportunities<'a>(
        &self,
        token: Option<&'a AuthToken>,
    ) -> Result<Vec<Opportunity>, RemoteCallError> {
        let mut request = self.client.get(self.endpoint(OPPORTUNITIES_PATH)?);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose());
        }
        let body = self.send(request).await?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|error| RemoteCallError::decode(format!("invalid catalogue JSON: {error}")))?;
        match normalise(value) {
            CatalogEnvelope::Listings(items) => Ok(decode_opportunities(items)),
            CatalogEnvelope::Malformed(reason) => Err(RemoteCallError::decode(format!(
                "unrecognised catalogue shape: {reason}"
            ))),
        }
    }
}

#[async_trait]
impl NewsletterGateway for HttpPortal {
    async fn subscribe(&self, email: &str) -> Result<(), RemoteCallError> {
        self.send(
            self.client
                .post(self.endpoint(NEWSLETTER_PATH)?)
                .json(&NewsletterRequestDto { email }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStorage for HttpPortal {
    async fn upload(
        &self,
        token: &AuthToken,
        file: &UploadFile,
        context: &UploadContext,
    ) -> Result<DocumentReference, RemoteCallError> {
        match context {
            UploadContext::ApplicationDocument { opportunity_id } => {
                let form = Form::new()
                    .part("document", Self::file_part(file)?)
                    .text("opportunityId", opportunity_id.to_string());
                let body = self
                    .send(
                        self.client
                            .post(self.endpoint(DOCUMENT_UPLOAD_PATH)?)
                            .bearer_auth(token.expose())
                            .multipart(form),
                    )
                    .await?;
                decode_upload(&body, &file.file_name, self.clock.utc())
            }
            UploadContext::ProfilePhoto => {
                self.upload_profile_asset(token, file, ProfileAsset::Photo)
                    .await
            }
            UploadContext::Resume => {
                self.upload_profile_asset(token, file, ProfileAsset::Resume)
                    .await
            }
        }
    }
}

#[async_trait]
impl ApplicationLedger for HttpPortal {
    async fn submit(
        &self,
        token: &AuthToken,
        submission: &ApplicationSubmission,
        key: &IdempotencyKey,
    ) -> Result<Application, RemoteCallError> {
        let body = self
            .send(
                self.client
                    .post(self.endpoint(APPLICATIONS_PATH)?)
                    .bearer_auth(token.expose())
                    .header(IDEMPOTENCY_KEY_HEADER, key.as_ref())
                    .json(submission),
            )
            .await?;
        decode_application(&body)
    }

    async fn my_applications(&self, token: &AuthToken) -> Result<Vec<Application>, RemoteCallError> {
        let body = self
            .send(
                self.client
                    .get(self.endpoint(MY_APPLICATIONS_PATH)?)
                    .bearer_auth(token.expose()),
            )
            .await?;
        decode_my_applications(&body)
    }
}

#[async_trait]
impl ProfileGateway for HttpPortal {
    async fn complete_profile(&self, token: &AuthToken) -> Result<ProfileSnapshot, RemoteCallError> {
        let body = self
            .send(
                self.client
                    .get(self.endpoint(COMPLETE_PROFILE_PATH)?)
                    .bearer_auth(token.expose()),
            )
            .await?;
        decode_profile(&body)
    }

    async fn update_profile(
        &self,
        token: &AuthToken,
        profile: &CandidateProfile,
    ) -> Result<Identity, RemoteCallError> {
        let body = self
            .send(
                self.client
                    .put(self.endpoint(PROFILE_PATH)?)
                    .bearer_auth(token.expose())
                    .json(profile),
            )
            .await?;
        decode_identity(&body)
    }

    async fn delete_asset(&self, token: &AuthToken, asset: ProfileAsset) -> Result<(), RemoteCallError> {
        self.send(
            self.client
                .delete(self.endpoint(asset.path())?)
                .bearer_auth(token.expose()),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for URL resolution.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:5000", "http://localhost:5000/api/auth/login")]
    #[case("http://localhost:5000/", "http://localhost:5000/api/auth/login")]
    #[case("https://portal.example/v2", "https://portal.example/v2/api/auth/login")]
    fn endpoints_resolve_under_the_base(#[case] base: &str, #[case] expected: &str) {
        let portal = HttpPortal::new(Url::parse(base).expect("url"), Duration::from_secs(5))
            .expect("client");
        assert_eq!(portal.endpoint(LOGIN_PATH).expect("endpoint").as_str(), expected);
        assert_eq!(
            portal.endpoint(ProfileAsset::Photo.path()).expect("endpoint").as_str(),
            expected.replace("auth/login", "profile/photo")
        );
    }
}
