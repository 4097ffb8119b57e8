//! Route guard
//!
//! Decides whether a navigation target is reachable given the current
//! authentication state. Pure functions only; the caller performs the
//! navigation.

/// Screens of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Register,
    Profile,
}

impl Screen {
    pub const fn path(self) -> &'static str {
        match self {
            Screen::Login => "/login",
            Screen::Register => "/register",
            Screen::Profile => "/profile",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match normalize(path) {
            "/login" => Some(Screen::Login),
            "/register" => Some(Screen::Register),
            "/profile" => Some(Screen::Profile),
            _ => None,
        }
    }

    /// Screens only meaningful while logged out
    pub const fn is_auth_only(self) -> bool {
        matches!(self, Screen::Login | Screen::Register)
    }

    /// Screens that require a session
    pub const fn is_protected(self) -> bool {
        matches!(self, Screen::Profile)
    }
}

/// Outcome of guarding a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(Screen),
    /// Send to the login screen, remembering where the user was headed
    RedirectToLogin { from: Option<String> },
    RedirectToProfile,
}

/// Guard a navigation to `path`
pub fn guard(path: &str, is_authenticated: bool) -> GuardDecision {
    let path = normalize(path);
    if path == "/" {
        return GuardDecision::RedirectToProfile;
    }

    match Screen::from_path(path) {
        Some(screen) if screen.is_protected() && !is_authenticated => {
            GuardDecision::RedirectToLogin {
                from: Some(path.to_string()),
            }
        }
        Some(screen) if screen.is_auth_only() && is_authenticated => {
            GuardDecision::RedirectToProfile
        }
        Some(screen) => GuardDecision::Allow(screen),
        None => GuardDecision::RedirectToLogin { from: None },
    }
}

/// Follow guard redirects from `path` to the screen that will be shown
///
/// Returns the screen and the preserved origin of a login redirect, if any.
pub fn resolve(path: &str, is_authenticated: bool) -> (Screen, Option<String>) {
    let mut target = path.to_string();
    let mut from = None;
    // Redirect chains are at most "/" -> "/profile" -> "/login"
    for _ in 0..4 {
        match guard(&target, is_authenticated) {
            GuardDecision::Allow(screen) => return (screen, from),
            GuardDecision::RedirectToProfile => target = Screen::Profile.path().to_string(),
            GuardDecision::RedirectToLogin { from: origin } => {
                from = origin;
                target = Screen::Login.path().to_string();
            }
        }
    }
    let fallback = if is_authenticated {
        Screen::Profile
    } else {
        Screen::Login
    };
    (fallback, from)
}

/// Where to go after a successful login
///
/// The preserved origin of the login redirect, or the profile screen.
pub fn post_login_destination(from: Option<&str>) -> &str {
    match from.map(normalize) {
        Some(path) if Screen::from_path(path).is_some_and(Screen::is_protected) => path,
        _ => Screen::Profile.path(),
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}
