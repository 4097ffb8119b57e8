//! Session controller
//!
//! Drives the transport and keeps the store and the idle timer in step.
//!
//! Every session start and every logout advances a generation counter. A
//! request remembers the generation it was issued under; if the counter has
//! moved by the time the response arrives, the response belongs to a session
//! that no longer exists and is discarded with [`SessionError::Superseded`].
//! The idle timer carries the generation that armed it for the same reason.

use super::{IdleTimer, Session, SessionStore};
use crate::error::{SessionError, SessionResult};
use crate::storage::Storage;
use crate::transport::{CredentialTransport, TransportError};
use crate::types::{Credentials, ProfileUpdate, Registration, User};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

struct ControllerState<S: Storage> {
    store: SessionStore<S>,
    timer: IdleTimer,
    generation: u64,
    in_flight: usize,
}

impl<S: Storage> ControllerState<S> {
    fn end_session(&mut self) {
        self.generation += 1;
        self.timer.cancel();
        self.store.clear();
    }
}

type SharedState<S> = Arc<Mutex<ControllerState<S>>>;

fn lock_state<S: Storage>(state: &SharedState<S>) -> MutexGuard<'_, ControllerState<S>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a request as in flight for [`SessionController::is_loading`]
struct InFlight<S: Storage> {
    state: SharedState<S>,
}

impl<S: Storage> Drop for InFlight<S> {
    fn drop(&mut self) {
        let mut state = lock_state(&self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

/// Orchestrates login, registration, profile calls and logout
///
/// The controller does not serialize calls. The UI is expected to disable
/// re-submission while [`is_loading`](Self::is_loading) is true.
pub struct SessionController<T, S: Storage> {
    transport: T,
    state: SharedState<S>,
    idle_timeout: Duration,
}

impl<T, S> SessionController<T, S>
where
    T: CredentialTransport,
    S: Storage + 'static,
{
    /// Idle window after which a session is logged out
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

    /// Create a controller whose session is rehydrated from `storage`
    ///
    /// A rehydrated session has no idle timer until the next session start.
    pub fn new(transport: T, storage: S) -> Self {
        Self::with_store(transport, SessionStore::restore(storage))
    }

    /// Create a controller around an existing store
    pub fn with_store(transport: T, store: SessionStore<S>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(ControllerState {
                store,
                timer: IdleTimer::new(),
                generation: 0,
                in_flight: 0,
            })),
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Override the idle timeout
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState<S>> {
        lock_state(&self.state)
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.lock().store.session().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().store.session().is_authenticated()
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().store.session().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock().store.session().access_token.clone()
    }

    /// Whether any request issued through this controller is still in flight
    pub fn is_loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn timer_pending(&self) -> bool {
        self.lock().timer.is_pending()
    }

    /// When the idle timer will log the session out
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.lock().timer.expires_at()
    }

    /// Receive the session every time it changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.lock().store.subscribe()
    }

    /// Submit credentials and start a session with the returned token
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<User> {
        let credentials = Credentials::new(email, password);
        let (_loading, generation) = self.begin_request();

        debug!("Submitting login for {}", credentials.email);
        let response = self.transport.login(&credentials).await.map_err(|e| {
            warn!("Login failed for {}: {}", credentials.email, e);
            SessionError::from_login_failure(e)
        })?;
        self.ensure_current(generation)?;

        let token = response
            .into_token()
            .ok_or_else(|| SessionError::invalid_response("login response carried no token"))?;
        self.start_session(token).await
    }

    /// Start a session with a token obtained out of band
    pub async fn login_with_token(&self, token: &str) -> SessionResult<User> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::invalid_response("empty access token"));
        }
        let (_loading, _) = self.begin_request();
        self.start_session(token.to_string()).await
    }

    /// Exchange a third-party identity token and start a session with the result
    pub async fn login_federated(&self, provider_token: &str) -> SessionResult<User> {
        let (_loading, generation) = self.begin_request();

        debug!("Exchanging federated identity token");
        let response = self
            .transport
            .exchange_federated_token(provider_token)
            .await
            .map_err(|e| {
                warn!("Federated token exchange failed: {}", e);
                SessionError::from_login_failure(e)
            })?;
        self.ensure_current(generation)?;

        let token = response.into_token().ok_or_else(|| {
            SessionError::invalid_response("federated exchange response carried no token")
        })?;
        self.start_session(token).await
    }

    /// Create an account; the caller stays logged out until it calls [`login`](Self::login)
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        firstname: &str,
        lastname: &str,
    ) -> SessionResult<()> {
        let registration = Registration {
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let (_loading, _) = self.begin_request();

        self.transport
            .register(&registration)
            .await
            .map_err(|e| {
                warn!("Registration failed for {}: {}", registration.email, e);
                SessionError::from_registration_failure(e)
            })?;

        info!("Registered account {}", registration.email);
        Ok(())
    }

    /// Register, then log in with the same credentials
    pub async fn register_and_login(
        &self,
        email: &str,
        password: &str,
        firstname: &str,
        lastname: &str,
    ) -> SessionResult<User> {
        self.register(email, password, firstname, lastname).await?;
        self.login(email, password).await
    }

    /// Re-fetch the profile of the current session
    ///
    /// A failure ends the session, like the fetch that follows login.
    pub async fn refresh_profile(&self) -> SessionResult<User> {
        let (token, generation) = self.current_token()?;
        let (_loading, _) = self.begin_request();
        self.load_profile(&token, generation).await
    }

    /// Send a partial profile update and store the server's version of the user
    pub async fn update_profile(&self, update: &ProfileUpdate) -> SessionResult<User> {
        if update.is_empty() {
            return Err(SessionError::update_failed("no fields to update"));
        }
        let (token, generation) = self.current_token()?;
        let (_loading, _) = self.begin_request();

        let result = self.transport.update_profile(&token, update).await;

        let mut state = self.lock();
        if state.generation != generation {
            return Err(SessionError::Superseded);
        }
        match result {
            Ok(Some(user)) => {
                info!("Updated profile for {}", user.email);
                state.store.set_user(Some(user.clone()));
                Ok(user)
            }
            Ok(None) => Err(SessionError::update_failed(
                "update response carried no user",
            )),
            Err(TransportError::Unauthorized(message)) => {
                warn!("Profile update rejected as unauthorized; logging out");
                state.end_session();
                Err(SessionError::update_failed(message))
            }
            Err(e) => {
                warn!("Profile update failed: {}", e);
                Err(SessionError::from_update_failure(e))
            }
        }
    }

    /// Clear the session, cancel the idle timer and remove stored entries
    ///
    /// Calling it while logged out changes nothing observable, but any request
    /// still in flight will have its response discarded.
    pub fn logout(&self) {
        let mut state = self.lock();
        if state.store.session().is_authenticated() {
            info!("Logging out");
        }
        state.end_session();
    }

    fn begin_request(&self) -> (InFlight<S>, u64) {
        let mut state = self.lock();
        state.in_flight += 1;
        let guard = InFlight {
            state: self.state.clone(),
        };
        (guard, state.generation)
    }

    fn ensure_current(&self, generation: u64) -> SessionResult<()> {
        if self.lock().generation == generation {
            Ok(())
        } else {
            debug!("Discarding response issued under a previous session");
            Err(SessionError::Superseded)
        }
    }

    fn current_token(&self) -> SessionResult<(String, u64)> {
        let state = self.lock();
        let token = state
            .store
            .session()
            .access_token
            .clone()
            .ok_or(SessionError::NotAuthenticated)?;
        Ok((token, state.generation))
    }

    async fn start_session(&self, token: String) -> SessionResult<User> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            let generation = state.generation;

            if state.store.session().access_token.as_deref() != Some(token.as_str()) {
                state.store.set_user(None);
            }
            state.store.set_access_token(Some(token.clone()));
            self.arm_timer(&mut state, generation);
            generation
        };

        debug!(
            "Session started; idle timeout {}s",
            self.idle_timeout.as_secs()
        );
        self.load_profile(&token, generation).await
    }

    fn arm_timer(&self, state: &mut ControllerState<S>, generation: u64) {
        let shared = Arc::downgrade(&self.state);
        state.timer.arm(self.idle_timeout, move || {
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut state = lock_state(&shared);
            if state.generation == generation {
                info!("Session idle timeout reached; logging out");
                state.end_session();
            }
        });
    }

    async fn load_profile(&self, token: &str, generation: u64) -> SessionResult<User> {
        let outcome = match self.transport.fetch_profile(token).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(SessionError::profile_fetch_failed(
                "profile response carried no user",
            )),
            Err(e) => Err(SessionError::from_profile_failure(e)),
        };

        let mut state = self.lock();
        if state.generation != generation {
            return Err(SessionError::Superseded);
        }
        match outcome {
            Ok(user) => {
                info!("Authenticated as {}", user.email);
                state.store.set_user(Some(user.clone()));
                Ok(user)
            }
            Err(error) => {
                warn!("{}; logging out", error);
                state.end_session();
                Err(error)
            }
        }
    }
}
