//! Wire and session data types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Role assigned to a user by the auth API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    User,
    /// Any role this client does not know about, kept verbatim
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
            Role::Other(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else if value.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Other(value.to_string())
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from(raw.as_str()))
    }
}

/// Profile of the authenticated user as returned by the server
///
/// Replaced wholesale on every fetch or update, never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub role: Role,
}

impl User {
    /// "Firstname Lastname"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }

    /// Upper-cased first letters of first and last name, e.g. "JD"
    pub fn initials(&self) -> String {
        self.firstname
            .chars()
            .take(1)
            .chain(self.lastname.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Login request body
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account creation request body
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Partial profile update; only the present fields are sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.firstname.is_none() && self.lastname.is_none()
    }
}

/// Response of the login and federated exchange endpoints
///
/// The token is optional so a success response without one can be told
/// apart from a transport failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenResponse {
    /// The token, if present and non-empty
    pub fn into_token(self) -> Option<String> {
        self.token.filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> User {
        User {
            email: "a@b.com".to_string(),
            firstname: "Jane".to_string(),
            lastname: "Doe".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn role_decoding_is_case_insensitive() {
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
        let role: Role = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(role, Role::Other("auditor".to_string()));
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
    }

    #[test]
    fn user_helpers() {
        let user = jane();
        assert_eq!(user.display_name(), "Jane Doe");
        assert_eq!(user.initials(), "JD");

        let single = User {
            lastname: String::new(),
            ..jane()
        };
        assert_eq!(single.initials(), "J");
        assert_eq!(single.display_name(), "Jane");
    }

    #[test]
    fn user_decodes_server_payload() {
        let user: User = serde_json::from_str(
            r#"{"email":"a@b.com","firstname":"Jane","lastname":"Doe","role":"user","id":7}"#,
        )
        .unwrap();
        assert_eq!(user, jane());
    }

    #[test]
    fn profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            firstname: Some("Janet".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "firstname": "Janet" })
        );
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn token_response_treats_empty_token_as_missing() {
        let response: TokenResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.into_token(), None);
        let response: TokenResponse = serde_json::from_str(r#"{"token":""}"#).unwrap();
        assert_eq!(response.into_token(), None);
        let response: TokenResponse = serde_json::from_str(r#"{"token":"T"}"#).unwrap();
        assert_eq!(response.into_token(), Some("T".to_string()));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let credentials = Credentials::new("a@b.com", "hunter2");
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
