//! Authfront core: client-side session lifecycle
//!
//! This crate owns everything a front end needs to track "am I logged in, and
//! for how much longer": the session record and its durable mirror, the idle
//! expiry timer, the controller that drives login/registration/profile calls
//! through a [`CredentialTransport`], and the route guard.

pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod storage;
pub mod transport;
pub mod types;

pub use config::{ApiConfig, ClientConfig, ConfigLoadError, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use guard::{GuardDecision, Screen, guard, post_login_destination, resolve};
pub use session::{IdleTimer, Session, SessionController, SessionStore};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use transport::{CredentialTransport, TransportError};
pub use types::{Credentials, ProfileUpdate, Registration, Role, TokenResponse, User};
