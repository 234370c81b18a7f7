//! Post-login backend notification.
//!
//! Best effort only: the callback flow logs every failure here and carries
//! on with the sign-in.

pub mod edge;

pub use edge::EdgeFunctionNotifier;

use serde::Serialize;

use crate::auth::session::Session;

/// Payload sent when a user has authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginNotification {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: String,
}

impl LoginNotification {
    pub fn from_session(session: &Session, role: &str) -> Self {
        Self {
            id: session.user.id.clone(),
            email: session.user.email.clone(),
            name: session.user.display_name().map(str::to_string),
            role: role.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver `notice` on behalf of the session owning `access_token`.
    async fn notify(&self, notice: &LoginNotification, access_token: &str)
        -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::User;

    #[test]
    fn test_from_session() {
        let mut user = User::new("u-1").with_email("player@wehand.app");
        user.user_metadata.name = Some("player".into());
        let session = Session::new("at", "rt", user);

        let notice = LoginNotification::from_session(&session, "user");
        assert_eq!(notice.id, "u-1");
        assert_eq!(notice.email.as_deref(), Some("player@wehand.app"));
        assert_eq!(notice.name.as_deref(), Some("player"));
        assert_eq!(notice.role, "user");

        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["id"], "u-1");
        assert_eq!(json["role"], "user");
    }
}
