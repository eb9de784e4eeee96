//! Wiring of adapters, the session store, and services.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::info;

use crate::config::{ClientSettings, SettingsError};
use crate::domain::ports::{CredentialStore, CredentialStoreError};
use crate::domain::{
    ApplicationComposer, ApplicationsService, CatalogService, NewsletterService, ProfileService,
    ReadRetry, RetryRuntime, SelectionHandoff, SessionService, SessionStore, SessionView,
};
use crate::outbound::http::HttpPortal;
use crate::outbound::storage::FileCredentialStore;

/// Failure to assemble a [`PortalClient`].
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A setting is out of range or malformed.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
    /// The session directory could not be opened.
    #[error("credential storage: {0}")]
    Storage(#[from] CredentialStoreError),
}

/// Every service of the portal, sharing one adapter and one session store.
pub struct PortalClient {
    portal: Arc<HttpPortal>,
    store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    session: SessionService<HttpPortal>,
    catalog: CatalogService<HttpPortal>,
    applications: ApplicationsService<HttpPortal>,
    profile: ProfileService<HttpPortal, HttpPortal>,
    newsletter: NewsletterService<HttpPortal>,
    handoff: SelectionHandoff,
}

impl PortalClient {
    /// Build a client from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] for an invalid base URL or timeout, a
    /// reqwest client that cannot be built, or an unusable storage
    /// directory.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, BootstrapError> {
        let base = settings.api_base_url()?;
        let portal = HttpPortal::new(base, settings.request_timeout()?)?;
        let storage_dir = settings.storage_dir();
        let credentials = FileCredentialStore::open(&storage_dir)?;
        info!(base = %portal.base(), storage = %storage_dir, "portal client configured");
        let retry = ReadRetry::new(settings.retry_policy(), RetryRuntime::default());
        Ok(Self::from_parts(
            portal,
            Arc::new(credentials),
            retry,
            Arc::new(DefaultClock),
        ))
    }

    /// Build a client from already constructed parts.
    pub fn from_parts(
        portal: HttpPortal,
        credentials: Arc<dyn CredentialStore>,
        retry: ReadRetry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let portal = Arc::new(portal.with_clock(Arc::clone(&clock)));
        let store = Arc::new(SessionStore::new(credentials));
        Self {
            session: SessionService::new(Arc::clone(&portal), Arc::clone(&store), retry.clone()),
            catalog: CatalogService::new(Arc::clone(&portal), Arc::clone(&store), retry.clone()),
            applications: ApplicationsService::new(
                Arc::clone(&portal),
                Arc::clone(&store),
                retry.clone(),
            ),
            profile: ProfileService::new(
                Arc::clone(&portal),
                Arc::clone(&portal),
                Arc::clone(&store),
                retry,
            ),
            newsletter: NewsletterService::new(Arc::clone(&portal)),
            handoff: SelectionHandoff::default(),
            portal,
            store,
            clock,
        }
    }

    /// Read-only session view for presentation code.
    pub fn session_view(&self) -> SessionView {
        self.store.view()
    }

    /// Login, registration, logout, and start-up resolution.
    pub const fn session(&self) -> &SessionService<HttpPortal> {
        &self.session
    }

    /// Opportunity catalogue.
    pub const fn catalog(&self) -> &CatalogService<HttpPortal> {
        &self.catalog
    }

    /// The signed-in candidate's applications.
    pub const fn applications(&self) -> &ApplicationsService<HttpPortal> {
        &self.applications
    }

    /// Candidate profile and profile assets.
    pub const fn profile(&self) -> &ProfileService<HttpPortal, HttpPortal> {
        &self.profile
    }

    /// Newsletter sign-up.
    pub const fn newsletter(&self) -> &NewsletterService<HttpPortal> {
        &self.newsletter
    }

    /// Pending opportunity selection carried across a navigation.
    pub const fn handoff(&self) -> &SelectionHandoff {
        &self.handoff
    }

    /// Fresh composer with its own idempotency key.
    pub fn composer(&self) -> ApplicationComposer<HttpPortal, HttpPortal> {
        ApplicationComposer::new(
            Arc::clone(&self.portal),
            Arc::clone(&self.portal),
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
        )
    }
}
