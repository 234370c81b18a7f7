use crate::auth::error::AuthError;

/// Generic message when the provider reports an error without a description.
pub const GENERIC_LOGIN_ERROR: &str = "로그인 중 오류가 발생했습니다. 다시 시도해주세요.";

/// Shown when no usable session could be resolved.
pub const MISSING_SESSION_MESSAGE: &str = "로그인 세션을 찾을 수 없습니다. 다시 로그인해주세요.";

/// Shown when the resolved session could not be established in the store.
pub const SESSION_ESTABLISHMENT_MESSAGE: &str = "로그인 세션을 설정하지 못했습니다. 다시 시도해주세요.";

/// Terminal failures of the callback flow.
///
/// Each one moves the page to the error state and sends the user back to
/// sign-up. Notification failures are not part of this enum: they never
/// fail the flow.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The provider redirected back with an `error` parameter.
    #[error("Provider reported {code}: {}", .description.as_deref().unwrap_or("no description"))]
    ProviderReported {
        code: String,
        description: Option<String>,
    },

    /// No source yielded a session with both tokens.
    #[error("No session could be resolved from the callback")]
    MissingSession,

    /// Setting the resolved session into the store failed.
    #[error("Failed to establish session: {0}")]
    SessionEstablishment(#[source] AuthError),
}

impl CallbackError {
    /// Message for the error screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderReported { description, .. } => description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(GENERIC_LOGIN_ERROR)
                .to_string(),
            Self::MissingSession => MISSING_SESSION_MESSAGE.to_string(),
            Self::SessionEstablishment(_) => SESSION_ESTABLISHMENT_MESSAGE.to_string(),
        }
    }

    /// Short machine-readable kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProviderReported { .. } => "provider_reported",
            Self::MissingSession => "missing_session",
            Self::SessionEstablishment(_) => "session_establishment",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_description_is_user_message() {
        let err = CallbackError::ProviderReported {
            code: "access_denied".into(),
            description: Some("User denied access".into()),
        };
        assert_eq!(err.user_message(), "User denied access");
        assert_eq!(err.to_string(), "Provider reported access_denied: User denied access");
    }

    #[test]
    fn test_provider_without_description_uses_fallback() {
        let err = CallbackError::ProviderReported {
            code: "server_error".into(),
            description: None,
        };
        assert_eq!(err.user_message(), GENERIC_LOGIN_ERROR);
        assert_eq!(err.kind(), "provider_reported");
    }

    #[test]
    fn test_session_errors() {
        assert_eq!(CallbackError::MissingSession.user_message(), MISSING_SESSION_MESSAGE);
        let err = CallbackError::SessionEstablishment(AuthError::NoSession);
        assert_eq!(err.user_message(), SESSION_ESTABLISHMENT_MESSAGE);
        assert!(std::error::Error::source(&err).is_some());
    }
}
