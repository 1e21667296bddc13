use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authentication service backing an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthService {
    /// Trainer club accounts
    #[default]
    Ptc,
    /// Google accounts
    Google,
}

impl fmt::Display for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ptc => write!(f, "ptc"),
            Self::Google => write!(f, "google"),
        }
    }
}

impl FromStr for AuthService {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ptc" => Ok(Self::Ptc),
            "google" => Ok(Self::Google),
            other => Err(format!("unknown auth service: {other}")),
        }
    }
}

/// Login credentials for one scanning account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Credentials {
    #[serde(default)]
    pub auth_service: AuthService,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        auth_service: AuthService,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_service,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Copy of these credentials with the password masked, for display
    pub fn redacted(&self) -> Self {
        Self {
            auth_service: self.auth_service,
            username: self.username.clone(),
            password: "********".to_string(),
        }
    }
}

// Passwords must never reach the logs through `{:?}`.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_service", &self.auth_service)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
