use super::Session;
use crate::storage::Storage;
use crate::types::User;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Holds the current [`Session`], mirrors it into durable storage and
/// broadcasts every change to subscribers
pub struct SessionStore<S: Storage> {
    storage: S,
    session: Session,
    changes: watch::Sender<Session>,
}

impl<S: Storage> SessionStore<S> {
    /// Storage key for the JSON-encoded user
    pub const USER_KEY: &'static str = "user";

    /// Storage key for the raw access token
    pub const ACCESS_TOKEN_KEY: &'static str = "accessToken";

    /// Create an empty store without reading storage
    pub fn new(storage: S) -> Self {
        Self::with_session(storage, Session::default())
    }

    /// Create a store rehydrated from storage
    ///
    /// Anything that does not decode is treated as absent and its entry is
    /// dropped. A stored user without a stored token is discarded too.
    pub fn restore(storage: S) -> Self {
        let access_token = read_entry(&storage, Self::ACCESS_TOKEN_KEY)
            .filter(|token| !token.trim().is_empty());

        let mut user = read_entry(&storage, Self::USER_KEY).and_then(|raw| {
            match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Ignoring malformed stored user: {}", e);
                    remove_entry(&storage, Self::USER_KEY);
                    None
                }
            }
        });

        if access_token.is_none() && user.is_some() {
            warn!("Ignoring stored user without an access token");
            remove_entry(&storage, Self::USER_KEY);
            user = None;
        }

        debug!(
            authenticated = access_token.is_some(),
            has_user = user.is_some(),
            "Restored session from storage"
        );

        Self::with_session(storage, Session { user, access_token })
    }

    fn with_session(storage: S, session: Session) -> Self {
        let (changes, _) = watch::channel(session.clone());
        Self {
            storage,
            session,
            changes,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Receive the session every time it changes
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.changes.subscribe()
    }

    /// Replace the access token and mirror it to storage
    pub fn set_access_token(&mut self, token: Option<String>) {
        if self.session.access_token == token {
            return;
        }
        self.session.access_token = token;
        self.persist_access_token();
        self.publish();
    }

    /// Replace the user and mirror it to storage
    pub fn set_user(&mut self, user: Option<User>) {
        if self.session.user == user {
            return;
        }
        self.session.user = user;
        self.persist_user();
        self.publish();
    }

    /// Empty the session and remove both storage entries
    pub fn clear(&mut self) {
        let was_empty = self.session == Session::default();
        self.session = Session::default();
        remove_entry(&self.storage, Self::ACCESS_TOKEN_KEY);
        remove_entry(&self.storage, Self::USER_KEY);
        if !was_empty {
            self.publish();
        }
    }

    fn persist_access_token(&self) {
        match &self.session.access_token {
            Some(token) => {
                if let Err(e) = self.storage.set_item(Self::ACCESS_TOKEN_KEY, token) {
                    warn!("Failed to persist access token: {}", e);
                }
            }
            None => remove_entry(&self.storage, Self::ACCESS_TOKEN_KEY),
        }
    }

    fn persist_user(&self) {
        match &self.session.user {
            Some(user) => match serde_json::to_string(user) {
                Ok(encoded) => {
                    if let Err(e) = self.storage.set_item(Self::USER_KEY, &encoded) {
                        warn!("Failed to persist user: {}", e);
                    }
                }
                Err(e) => warn!("Failed to encode user: {}", e),
            },
            None => remove_entry(&self.storage, Self::USER_KEY),
        }
    }

    fn publish(&self) {
        self.changes.send_replace(self.session.clone());
    }
}

fn read_entry<S: Storage>(storage: &S, key: &str) -> Option<String> {
    match storage.get_item(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to read {} from storage: {}", key, e);
            None
        }
    }
}

fn remove_entry<S: Storage>(storage: &S, key: &str) {
    if let Err(e) = storage.remove_item(key) {
        warn!("Failed to remove {} from storage: {}", key, e);
    }
}
