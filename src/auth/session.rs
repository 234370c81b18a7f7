//! Session and user types as returned by the hosted auth service.
//!
//! Field names follow the Supabase Auth JSON payloads so the same structs
//! serve for HTTP decoding and for local persistence.

use serde::{Deserialize, Serialize};

/// Safety margin for expiry checks (60 seconds).
const EXPIRY_SAFETY_MARGIN_SECS: i64 = 60;

/// An authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,

    /// Unix timestamp when the access token expires, if known.
    #[serde(default)]
    pub expires_at: Option<i64>,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>, user: User) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: None,
            token_type: default_token_type(),
            user,
        }
    }

    /// Set the expiry from an `expires_in` value relative to now.
    pub fn expiring_in(mut self, expires_in: i64) -> Self {
        self.expires_at = Some(chrono::Utc::now().timestamp() + expires_in);
        self
    }

    /// Both tokens are present and non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Whether the access token has expired or expires within the safety margin.
    /// A session without a known expiry never counts as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => exp <= chrono::Utc::now().timestamp() + EXPIRY_SAFETY_MARGIN_SECS,
            None => false,
        }
    }
}

/// The user a session belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.app_metadata.provider = Some(provider.into());
        self
    }

    /// Display name, preferring `full_name` over `name`.
    ///
    /// Kakao fills `name`, Apple fills `full_name` (only on first consent),
    /// so both have to be consulted.
    pub fn display_name(&self) -> Option<&str> {
        self.user_metadata
            .full_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.user_metadata.name.as_deref().filter(|s| !s.is_empty()))
    }

    /// The identity provider that authenticated this user, if reported.
    pub fn provider(&self) -> Option<&str> {
        self.app_metadata.provider.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppMetadata {
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
