//! Session state: one writer, many read-only views.
//!
//! [`SessionStore`] owns the current [`SessionState`] and the durable
//! credential entries. Components that only need to know who is signed in
//! receive a [`SessionView`]. [`SessionService`] drives login, registration,
//! logout, and start-up resolution against the [`AuthGateway`] port.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::ports::{AuthGateway, CredentialStore, RemoteCallError, StoredCredentials};
use super::{
    AuthSession, AuthToken, Error, ErrorCode, Identity, IdentityValidationError, LoginCredentials,
    ReadRetry, Registration,
};

/// Who is signed in, as far as the client knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Durable storage has not been consulted yet.
    Resolving,
    /// Nobody is signed in.
    Anonymous,
    /// An identity with a bearer token.
    Authenticated(AuthSession),
}

impl SessionState {
    /// Identity, when authenticated.
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(session) => Some(&session.identity),
            _ => None,
        }
    }
}

/// Single writer of the session state.
pub struct SessionStore {
    sender: watch::Sender<SessionState>,
    credentials: Arc<dyn CredentialStore>,
}

impl SessionStore {
    /// Create a store in [`SessionState::Resolving`].
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        let (sender, _receiver) = watch::channel(SessionState::Resolving);
        Self {
            sender,
            credentials,
        }
    }

    /// Read-only view for other components.
    pub fn view(&self) -> SessionView {
        SessionView {
            receiver: self.sender.subscribe(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    /// Load durable credentials and publish the result.
    ///
    /// A token without an identity, an identity without a token, or an
    /// identity that no longer parses clears both entries.
    pub fn restore(&self) -> SessionState {
        let state = match self.credentials.load() {
            Ok(stored) => self.decode_stored(stored),
            Err(error) => {
                warn!(error = %error, "credential storage unreadable; starting anonymous");
                SessionState::Anonymous
            }
        };
        self.publish(state.clone());
        state
    }

    fn decode_stored(&self, stored: StoredCredentials) -> SessionState {
        match (stored.token, stored.user) {
            (None, None) => SessionState::Anonymous,
            (Some(token), Some(user)) => {
                let identity = serde_json::from_str::<Identity>(&user);
                let token = AuthToken::new(token.as_str());
                match (identity, token) {
                    (Ok(identity), Ok(token)) => {
                        SessionState::Authenticated(AuthSession { identity, token })
                    }
                    _ => {
                        warn!("stored session is unreadable; clearing it");
                        self.clear_storage();
                        SessionState::Anonymous
                    }
                }
            }
            _ => {
                warn!("stored session is incomplete; clearing it");
                self.clear_storage();
                SessionState::Anonymous
            }
        }
    }

    /// Persist and publish a fresh session.
    ///
    /// A storage failure is logged; the in-memory session still applies so
    /// the user stays signed in until the process ends.
    pub fn establish(&self, session: AuthSession) {
        match serde_json::to_string(&session.identity) {
            Ok(user_json) => {
                if let Err(error) = self.credentials.save(session.token.expose(), &user_json) {
                    warn!(error = %error, "failed to persist session");
                }
            }
            Err(error) => warn!(error = %error, "failed to serialise identity"),
        }
        self.publish(SessionState::Authenticated(session));
    }

    /// Replace the identity of the current session, keeping its token.
    ///
    /// Ignored unless authenticated.
    pub fn refresh_identity(&self, identity: Identity) {
        let current = self.state();
        if let SessionState::Authenticated(session) = current {
            self.establish(AuthSession {
                identity,
                token: session.token,
            });
        }
    }

    /// Clear durable and in-memory state. Idempotent.
    pub fn logout(&self) {
        self.clear_storage();
        self.publish(SessionState::Anonymous);
    }

    /// Forced logout after the remote rejected the token.
    pub fn expire(&self, reason: &str) {
        if matches!(self.state(), SessionState::Authenticated(_)) {
            warn!(reason, "session expired; signing out");
        }
        self.logout();
    }

    /// Expire the session when `error` is an authorisation failure.
    ///
    /// Returns whether the session was expired.
    pub fn expire_on_unauthorized(&self, error: &RemoteCallError) -> bool {
        if error.is_unauthorized() {
            let reason = error
                .remote_message()
                .filter(|message| !message.trim().is_empty())
                .unwrap_or("remote rejected the bearer token");
            self.expire(reason);
            return true;
        }
        false
    }

    fn clear_storage(&self) {
        if let Err(error) = self.credentials.clear() {
            warn!(error = %error, "failed to clear stored session");
        }
    }

    fn publish(&self, state: SessionState) {
        debug!(
            state = match &state {
                SessionState::Resolving => "resolving",
                SessionState::Anonymous => "anonymous",
                SessionState::Authenticated(_) => "authenticated",
            },
            "session state changed"
        );
        self.sender.send_replace(state);
    }
}

/// Read-only, cloneable view of the session.
#[derive(Clone)]
pub struct SessionView {
    receiver: watch::Receiver<SessionState>,
}

impl SessionView {
    /// Current state.
    pub fn state(&self) -> SessionState {
        self.receiver.borrow().clone()
    }

    /// Current identity, when authenticated.
    pub fn identity(&self) -> Option<Identity> {
        self.receiver.borrow().identity().cloned()
    }

    /// Current bearer token, when authenticated.
    pub fn bearer_token(&self) -> Option<AuthToken> {
        match &*self.receiver.borrow() {
            SessionState::Authenticated(session) => Some(session.token.clone()),
            _ => None,
        }
    }

    /// Wait for the next change. Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

/// Login, registration, logout, and start-up resolution.
pub struct SessionService<A> {
    gateway: Arc<A>,
    store: Arc<SessionStore>,
    retry: ReadRetry,
}

impl<A> SessionService<A> {
    /// Create a service writing to `store`.
    pub const fn new(gateway: Arc<A>, store: Arc<SessionStore>, retry: ReadRetry) -> Self {
        Self {
            gateway,
            store,
            retry,
        }
    }

    /// Store written by this service.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Sign out. No remote call is made.
    pub fn logout(&self) {
        info!("logging out");
        self.store.logout();
    }
}

impl<A> SessionService<A>
where
    A: AuthGateway,
{
    /// Sign in with an email and password.
    ///
    /// Inputs are validated locally first. On failure the session state and
    /// durable storage are left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, Error> {
        let credentials = LoginCredentials::try_from_parts(email, password).map_err(|error| {
            let field = if error == IdentityValidationError::EmptyPassword {
                "password"
            } else {
                "email"
            };
            Error::validation(error.to_string()).with_details(json!({ "field": field }))
        })?;

        let session = self
            .gateway
            .login(&credentials)
            .await
            .map_err(|error| error.to_domain_error(ErrorCode::Auth, "Login failed"))?;
        let identity = session.identity.clone();
        info!(user_id = %identity.id, "logged in");
        self.store.establish(session);
        Ok(identity)
    }

    /// Create an account and sign in as it.
    ///
    /// Field-level problems reported by the remote become
    /// [`ErrorCode::Validation`]; anything else is [`ErrorCode::Auth`].
    pub async fn register(&self, registration: &Registration) -> Result<Identity, Error> {
        let session = self
            .gateway
            .register(registration)
            .await
            .map_err(|error| match error {
                RemoteCallError::FieldErrors { .. } | RemoteCallError::Rejected { status: 400, .. } => {
                    error.to_domain_error(ErrorCode::Validation, "Registration failed")
                }
                _ => error.to_domain_error(ErrorCode::Auth, "Registration failed"),
            })?;
        let identity = session.identity.clone();
        info!(user_id = %identity.id, "registered");
        self.store.establish(session);
        Ok(identity)
    }

    /// Resolve the start-up state from durable storage.
    ///
    /// With `verify`, a restored token is checked remotely: rejection
    /// expires the session, a refreshed identity replaces the stored one,
    /// and an unreachable remote keeps the restored session.
    pub async fn resolve(&self, verify: bool) -> SessionState {
        let restored = self.store.restore();
        let SessionState::Authenticated(session) = &restored else {
            return restored;
        };
        if !verify {
            return restored;
        }

        let token = session.token.clone();
        let outcome = self
            .retry
            .run("verify_session", || self.gateway.verify(&token))
            .await;
        match outcome {
            Ok(identity) => self.store.refresh_identity(identity),
            Err(error) if self.store.expire_on_unauthorized(&error) => {}
            Err(error) => warn!(error = %error, "session verification failed; keeping stored session"),
        }
        self.store.state()
    }
}
