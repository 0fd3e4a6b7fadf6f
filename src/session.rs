use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::AuthProvider;
use crate::error::AppError;
use crate::gateway::CatalogGateway;
use crate::models::{AuthUser, Credentials, SignUpForm, SignUpOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Resolving,
    Authenticated { user: AuthUser, is_admin: bool },
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, SessionState::Authenticated { is_admin: true, .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Uninitialized | SessionState::Resolving)
    }
}

/// Identity and admin flag for one app instance. Pass it to whatever
/// needs the signed-in user; subscribe to follow transitions.
pub struct SessionContext {
    auth: Arc<dyn AuthProvider>,
    gateway: Arc<dyn CatalogGateway>,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
}

impl SessionContext {
    pub fn new(auth: Arc<dyn AuthProvider>, gateway: Arc<dyn CatalogGateway>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            auth,
            gateway,
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// App start: pick up whatever session the auth provider still holds.
    pub async fn initialize(&self) -> SessionState {
        let (generation, _) = self.begin_resolving();
        let session = match self.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("could not restore session: {}", e);
                None
            }
        };
        self.finish(generation, session.map(|s| s.user)).await
    }

    /// The state reads `Resolving` from the credential call until the
    /// admin flag is known. A failed attempt puts the prior state back.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SessionState, AppError> {
        let credentials = credentials.validated()?;
        let (generation, previous) = self.begin_resolving();
        let session = match self
            .auth
            .sign_in(&credentials.email, &credentials.password)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                self.restore(generation, previous);
                return Err(e.into());
            }
        };

        if let Some(current) = self.discard_if_overtaken(generation).await {
            return Ok(current);
        }
        Ok(self.finish(generation, Some(session.user)).await)
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<SignUpOutcome, AppError> {
        let form = form.validated()?;
        let (generation, previous) = self.begin_resolving();
        let outcome = match self
            .auth
            .sign_up(
                &form.credentials.email,
                &form.credentials.password,
                &form.full_name,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.restore(generation, previous);
                return Err(e.into());
            }
        };

        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                if let Err(e) = self
                    .gateway
                    .upsert_profile(&session.user.id, &form.full_name)
                    .await
                {
                    warn!("profile upsert after sign-up failed: {}", e);
                }
                if self.discard_if_overtaken(generation).await.is_none() {
                    self.finish(generation, Some(session.user.clone())).await;
                }
            }
            SignUpOutcome::ConfirmationRequired { .. } => self.restore(generation, previous),
        }

        Ok(outcome)
    }

    /// The local identity is cleared before the backend call, and stays
    /// cleared even when that call fails.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::Anonymous;
        });
        info!("session cleared");
        self.auth.sign_out().await.map_err(AppError::from)
    }

    /// Token refresh: re-read the identity and re-derive the admin flag.
    pub async fn refresh(&self) -> SessionState {
        let (generation, _) = self.begin_resolving();
        let user = match self.auth.refresh_session().await {
            Ok(session) => session.map(|s| s.user),
            Err(e) => {
                warn!("token refresh failed: {}", e);
                None
            }
        };
        self.finish(generation, user).await
    }

    /// Starts a resolution. Returns its generation and the state it replaced.
    fn begin_resolving(&self) -> (u64, SessionState) {
        let mut generation = 0;
        let mut previous = SessionState::Resolving;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            previous = std::mem::replace(state, SessionState::Resolving);
        });
        (generation, previous)
    }

    /// Generation check and publish happen under the channel's write lock,
    /// the same lock `begin_resolving` and `sign_out` bump it under.
    fn publish(&self, generation: u64, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        })
    }

    fn restore(&self, generation: u64, previous: SessionState) {
        let previous = match previous {
            // Whatever was resolving before was overtaken by this attempt.
            SessionState::Resolving => SessionState::Anonymous,
            other => other,
        };
        self.publish(generation, previous);
    }

    /// After a credential call: if a sign-out landed meanwhile, the fresh
    /// backend session is revoked so it cannot outlive the local identity.
    async fn discard_if_overtaken(&self, generation: u64) -> Option<SessionState> {
        if self.generation.load(Ordering::SeqCst) == generation {
            return None;
        }
        debug!("discarding stale credential result {}", generation);
        let current = self.state();
        if current == SessionState::Anonymous {
            if let Err(e) = self.auth.sign_out().await {
                warn!("revoking overtaken session failed: {}", e);
            }
        }
        Some(current)
    }

    async fn finish(&self, generation: u64, user: Option<AuthUser>) -> SessionState {
        let next = match user {
            Some(user) => {
                let is_admin = match self.gateway.is_admin(&user.id).await {
                    Ok(flag) => flag,
                    Err(e) => {
                        warn!("admin check for {} failed, assuming not admin: {}", user.id, e);
                        false
                    }
                };
                SessionState::Authenticated { user, is_admin }
            }
            None => SessionState::Anonymous,
        };

        if self.publish(generation, next.clone()) {
            next
        } else {
            debug!("discarding stale session resolution {}", generation);
            self.state()
        }
    }
}
