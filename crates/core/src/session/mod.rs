//! Session record, durable store, idle timer and controller

mod controller;
mod store;
mod timer;

pub use controller::SessionController;
pub use store::SessionStore;
pub use timer::IdleTimer;

use crate::types::User;
use std::fmt;

/// The client-held record of the current user and their access token
///
/// Authenticated if and only if an access token is present. A token without
/// a user is tolerated while the profile fetch that follows login is pending.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub access_token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("is_authenticated", &self.is_authenticated())
            .finish()
    }
}
