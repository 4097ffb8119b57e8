//! End-to-end session lifecycle scenarios against an in-process transport

use async_trait::async_trait;
use authfront_core::{
    CredentialTransport, Credentials, FileStorage, MemoryStorage, ProfileUpdate, Registration,
    Role, Session, SessionController, SessionError, Storage, TokenResponse, TransportError, User,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Call {
    Login,
    FetchProfile,
    UpdateProfile,
}

/// Tiny auth server: accounts by email, one token per account, optional latency
#[derive(Clone, Default)]
struct FakeTransport {
    accounts: Arc<Mutex<HashMap<String, (String, User)>>>,
    delays: Arc<Mutex<HashMap<(Call, String), Duration>>>,
    profile_fetches: Arc<AtomicUsize>,
}

impl FakeTransport {
    fn with_jane() -> Self {
        let transport = Self::default();
        transport.accounts.lock().unwrap().insert(
            "a@b.com".to_string(),
            ("pw".to_string(), jane()),
        );
        transport
    }

    fn delay(&self, call: Call, email: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert((call, email.to_string()), delay);
    }

    async fn wait(&self, call: Call, email: &str) {
        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(&(call, email.to_string()))
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn token_for(email: &str) -> String {
        format!("token-{email}")
    }

    fn user_for_token(&self, token: &str) -> Option<User> {
        let email = token.strip_prefix("token-")?;
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|(_, user)| user.clone())
    }
}

#[async_trait]
impl CredentialTransport for FakeTransport {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, TransportError> {
        self.wait(Call::Login, &credentials.email).await;
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(&credentials.email) {
            Some((password, _)) if *password == credentials.password => Ok(TokenResponse {
                token: Some(Self::token_for(&credentials.email)),
            }),
            _ => Err(TransportError::Unauthorized("Invalid credentials".to_string())),
        }
    }

    async fn register(&self, registration: &Registration) -> Result<(), TransportError> {
        if registration.email.is_empty() || registration.password.is_empty() {
            return Err(TransportError::Rejected {
                status: 400,
                message: "email and password are required".to_string(),
            });
        }
        let user = User {
            email: registration.email.clone(),
            firstname: registration.firstname.clone(),
            lastname: registration.lastname.clone(),
            role: Role::User,
        };
        self.accounts.lock().unwrap().insert(
            registration.email.clone(),
            (registration.password.clone(), user),
        );
        Ok(())
    }

    async fn fetch_profile(&self, token: &str) -> Result<Option<User>, TransportError> {
        self.profile_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(email) = token.strip_prefix("token-") {
            self.wait(Call::FetchProfile, email).await;
        }
        self.user_for_token(token)
            .map(Some)
            .ok_or_else(|| TransportError::Unauthorized("invalid token".to_string()))
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, TransportError> {
        let email = token
            .strip_prefix("token-")
            .ok_or_else(|| TransportError::Unauthorized("invalid token".to_string()))?;
        self.wait(Call::UpdateProfile, email).await;
        let mut accounts = self.accounts.lock().unwrap();
        let (_, user) = accounts
            .get_mut(email)
            .ok_or_else(|| TransportError::Unauthorized("invalid token".to_string()))?;
        if let Some(firstname) = &update.firstname {
            user.firstname = firstname.clone();
        }
        if let Some(lastname) = &update.lastname {
            user.lastname = lastname.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn exchange_federated_token(
        &self,
        provider_token: &str,
    ) -> Result<TokenResponse, TransportError> {
        let email = provider_token
            .strip_prefix("google:")
            .ok_or_else(|| TransportError::Unauthorized("bad id token".to_string()))?;
        Ok(TokenResponse {
            token: Some(Self::token_for(email)),
        })
    }
}

fn jane() -> User {
    User {
        email: "a@b.com".to_string(),
        firstname: "Jane".to_string(),
        lastname: "Doe".to_string(),
        role: Role::User,
    }
}

#[tokio::test]
async fn example_login_then_logout() {
    let controller = SessionController::new(FakeTransport::with_jane(), MemoryStorage::new());

    controller.login("a@b.com", "pw").await.unwrap();
    let session = controller.session();
    assert_eq!(session.access_token.as_deref(), Some("token-a@b.com"));
    assert_eq!(session.user, Some(jane()));
    assert!(session.is_authenticated());

    controller.logout();
    let session = controller.session();
    assert_eq!(session.access_token, None);
    assert_eq!(session.user, None);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn wrong_password_stays_logged_out() {
    let transport = FakeTransport::with_jane();
    let controller = SessionController::new(transport.clone(), MemoryStorage::new());

    let err = controller.login("a@b.com", "nope").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidCredentials { .. }));
    assert_eq!(controller.session(), Session::default());
    assert_eq!(transport.profile_fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn registration_alone_does_not_log_in() {
    let controller = SessionController::new(FakeTransport::default(), MemoryStorage::new());

    controller
        .register("new@b.com", "pw", "New", "User")
        .await
        .unwrap();
    assert!(!controller.is_authenticated());

    let user = controller.login("new@b.com", "pw").await.unwrap();
    assert_eq!(user.display_name(), "New User");
}

#[tokio::test]
async fn session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FakeTransport::with_jane();
    {
        let controller =
            SessionController::new(transport.clone(), FileStorage::in_dir(dir.path()));
        controller.login("a@b.com", "pw").await.unwrap();
    }

    let restarted = SessionController::new(transport, FileStorage::in_dir(dir.path()));
    let session = restarted.session();
    assert_eq!(session.access_token.as_deref(), Some("token-a@b.com"));
    assert_eq!(session.user, Some(jane()));
    assert!(!restarted.timer_pending());

    restarted.logout();
    let storage = FileStorage::in_dir(dir.path());
    assert_eq!(storage.get_item("accessToken").unwrap(), None);
    assert_eq!(storage.get_item("user").unwrap(), None);
}

#[tokio::test]
async fn stale_stored_token_is_dropped_on_refresh() {
    let storage = MemoryStorage::new();
    storage.set_item("accessToken", "token-gone@b.com").unwrap();

    let controller = SessionController::new(FakeTransport::with_jane(), storage.clone());
    assert!(controller.is_authenticated());

    let err = controller.refresh_profile().await.unwrap_err();
    assert!(matches!(err, SessionError::ProfileFetchFailed { .. }));
    assert!(!controller.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn federated_login_and_profile_update() {
    let controller = SessionController::new(FakeTransport::with_jane(), MemoryStorage::new());

    controller.login_federated("google:a@b.com").await.unwrap();
    assert_eq!(controller.current_user(), Some(jane()));

    let update = ProfileUpdate {
        lastname: Some("Roe".to_string()),
        ..Default::default()
    };
    let user = controller.update_profile(&update).await.unwrap();
    assert_eq!(user.display_name(), "Jane Roe");
    assert_eq!(controller.current_user().unwrap().initials(), "JR");
}

#[tokio::test(start_paused = true)]
async fn logout_during_login_discards_the_response() {
    let transport = FakeTransport::with_jane();
    transport.delay(Call::Login, "a@b.com", Duration::from_secs(2));
    let controller = Arc::new(SessionController::new(transport.clone(), MemoryStorage::new()));

    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.login("a@b.com", "pw").await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(controller.is_loading());
    controller.logout();

    let result = pending.await.unwrap();
    assert_eq!(result.unwrap_err(), SessionError::Superseded);
    assert_eq!(controller.session(), Session::default());
    assert!(!controller.timer_pending());
    assert!(!controller.is_loading());
    assert_eq!(transport.profile_fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn logout_during_profile_fetch_discards_the_user() {
    let transport = FakeTransport::with_jane();
    transport.delay(Call::FetchProfile, "a@b.com", Duration::from_secs(2));
    let storage = MemoryStorage::new();
    let controller = Arc::new(SessionController::new(transport.clone(), storage.clone()));

    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.login("a@b.com", "pw").await })
    };

    // Token accepted, profile still on its way
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(controller.is_authenticated());
    assert_eq!(controller.current_user(), None);
    assert!(controller.is_loading());
    controller.logout();

    let result = pending.await.unwrap();
    assert_eq!(result.unwrap_err(), SessionError::Superseded);
    assert_eq!(controller.session(), Session::default());
    assert!(storage.is_empty());
    assert!(!controller.timer_pending());
    assert!(!controller.is_loading());
    assert_eq!(transport.profile_fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn late_profile_from_an_older_session_is_discarded() {
    let transport = FakeTransport::with_jane();
    transport
        .register(&Registration {
            firstname: "John".to_string(),
            lastname: "Roe".to_string(),
            email: "j@b.com".to_string(),
            password: "pw2".to_string(),
        })
        .await
        .unwrap();
    transport.delay(Call::FetchProfile, "a@b.com", Duration::from_secs(2));
    let storage = MemoryStorage::new();
    let controller = Arc::new(SessionController::new(transport, storage.clone()));

    let older = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.login("a@b.com", "pw").await })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    let john = controller.login("j@b.com", "pw2").await.unwrap();
    assert_eq!(john.email, "j@b.com");

    assert_eq!(older.await.unwrap().unwrap_err(), SessionError::Superseded);
    let session = controller.session();
    assert_eq!(session.access_token.as_deref(), Some("token-j@b.com"));
    assert_eq!(session.user, Some(john));
    assert_eq!(
        storage.get_item("accessToken").unwrap().as_deref(),
        Some("token-j@b.com")
    );
    assert!(controller.timer_pending());
}

#[tokio::test(start_paused = true)]
async fn logout_during_update_discards_the_response() {
    let transport = FakeTransport::with_jane();
    transport.delay(Call::UpdateProfile, "a@b.com", Duration::from_secs(2));
    let storage = MemoryStorage::new();
    let controller = Arc::new(SessionController::new(transport, storage.clone()));
    controller.login("a@b.com", "pw").await.unwrap();

    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move {
            let update = ProfileUpdate {
                lastname: Some("Roe".to_string()),
                ..Default::default()
            };
            controller.update_profile(&update).await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(controller.is_loading());
    controller.logout();

    let result = pending.await.unwrap();
    assert_eq!(result.unwrap_err(), SessionError::Superseded);
    assert_eq!(controller.session(), Session::default());
    assert!(storage.is_empty());
    assert!(!controller.is_loading());
}

#[tokio::test(start_paused = true)]
async fn late_update_from_an_older_session_is_discarded() {
    let transport = FakeTransport::with_jane();
    transport.delay(Call::UpdateProfile, "a@b.com", Duration::from_secs(2));
    let controller = Arc::new(SessionController::new(transport, MemoryStorage::new()));
    controller.login("a@b.com", "pw").await.unwrap();

    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move {
            let update = ProfileUpdate {
                lastname: Some("Roe".to_string()),
                ..Default::default()
            };
            controller.update_profile(&update).await
        })
    };

    // Logging in again starts a new session before the update lands
    tokio::time::sleep(Duration::from_secs(1)).await;
    controller.login("a@b.com", "pw").await.unwrap();

    let result = pending.await.unwrap();
    assert_eq!(result.unwrap_err(), SessionError::Superseded);
    assert_eq!(controller.current_user(), Some(jane()));
    assert!(controller.is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn concurrent_logins_are_not_coordinated() {
    let transport = FakeTransport::with_jane();
    transport
        .register(&Registration {
            firstname: "John".to_string(),
            lastname: "Roe".to_string(),
            email: "j@b.com".to_string(),
            password: "pw2".to_string(),
        })
        .await
        .unwrap();
    transport.delay(Call::Login, "a@b.com", Duration::from_secs(2));
    transport.delay(Call::Login, "j@b.com", Duration::from_secs(1));
    let controller = SessionController::new(transport, MemoryStorage::new());

    // The slower request was issued first; the faster one starts a session
    // before it returns, so its response no longer matches the session.
    let (slow, fast) = tokio::join!(
        controller.login("a@b.com", "pw"),
        controller.login("j@b.com", "pw2"),
    );

    assert_eq!(slow.unwrap_err(), SessionError::Superseded);
    assert_eq!(fast.unwrap().email, "j@b.com");
    assert_eq!(controller.current_user().unwrap().email, "j@b.com");
}

#[tokio::test(start_paused = true)]
async fn idle_expiry_happens_once_at_the_deadline() {
    let storage = MemoryStorage::new();
    let controller = SessionController::new(FakeTransport::with_jane(), storage.clone());
    let mut changes = controller.subscribe();

    controller.login("a@b.com", "pw").await.unwrap();
    changes.borrow_and_update();

    let idle_timeout = SessionController::<FakeTransport, MemoryStorage>::DEFAULT_IDLE_TIMEOUT;
    tokio::time::sleep(idle_timeout - Duration::from_secs(1)).await;
    assert!(controller.is_authenticated());
    assert!(!changes.has_changed().unwrap());

    changes.changed().await.unwrap();
    assert!(!changes.borrow_and_update().is_authenticated());
    assert!(storage.is_empty());
    assert!(!controller.timer_pending());

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(!changes.has_changed().unwrap());
}
