//! Shared authentication traits.

use crate::auth::error::AuthError;
use crate::auth::session::Session;

/// The hosted identity service the sign-in flow talks to.
///
/// Implementations own the current session; callers only ever hold a
/// transient copy. One instance is shared process-wide.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// The currently established session, if any.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Establish a session from an access/refresh token pair.
    async fn set_session(&self, access_token: &str, refresh_token: &str)
        -> Result<Session, AuthError>;

    /// Refresh the current session. Fails with [`AuthError::NoSession`] when
    /// nothing refreshable exists.
    async fn refresh_session(&self) -> Result<Session, AuthError>;

    /// Build the provider authorization URL the user agent must be sent to.
    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str)
        -> Result<String, AuthError>;

    /// Exchange a PKCE authorization code for a session.
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let _ = code;
        Err(AuthError::Other(format!(
            "{} does not support authorization code exchange",
            self.name()
        )))
    }

    /// Name of this store, for logs.
    fn name(&self) -> &str;
}
