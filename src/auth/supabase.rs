//! Supabase Auth session store.
//!
//! Talks to the project's Auth REST API (`/auth/v1/...`) and keeps the
//! current session in a [`SessionStorage`] slot, the same way the JS client
//! keeps it in `localStorage`.
//!
//! # Endpoints
//! - User lookup: `GET /auth/v1/user`
//! - Refresh: `POST /auth/v1/token?grant_type=refresh_token`
//! - PKCE exchange: `POST /auth/v1/token?grant_type=pkce`
//! - Authorize (browser redirect): `GET /auth/v1/authorize`

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::auth::error::AuthError;
use crate::auth::oauth::pkce::{PKCE_METHOD, Pkce};
use crate::auth::session::{Session, User};
use crate::auth::storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
use crate::auth::traits::SessionStore;
use crate::config::{Config, FlowType, StorageBackend};
use crate::net::HttpClient;

/// Tokens expiring within this window are refreshed instead of validated.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub struct SupabaseSessionStore {
    base_url: String,
    anon_key: String,
    flow_type: FlowType,
    storage: Arc<dyn SessionStorage>,
    storage_key: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for SupabaseSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseSessionStore")
            .field("base_url", &self.base_url)
            .field("flow_type", &self.flow_type)
            .field("storage", &self.storage.name())
            .field("storage_key", &self.storage_key)
            .finish()
    }
}

impl SupabaseSessionStore {
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        storage: Arc<dyn SessionStorage>,
        storage_key: impl Into<String>,
        http: &HttpClient,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            flow_type: FlowType::Implicit,
            storage,
            storage_key: storage_key.into(),
            http: http.inner().clone(),
        }
    }

    /// Create a store using the storage backend from config.
    pub fn from_config(config: &Config, http: &HttpClient) -> Self {
        let storage: Arc<dyn SessionStorage> = match config.supabase.storage_backend {
            StorageBackend::File => Arc::new(FileSessionStorage::new(&config.supabase.storage_dir)),
            StorageBackend::Memory => Arc::new(MemorySessionStorage::new()),
        };
        Self::new(
            &config.supabase.url,
            config.supabase.anon_key.clone(),
            storage,
            config.supabase.effective_storage_key(),
            http,
        )
        .with_flow_type(config.supabase.flow_type)
    }

    pub fn with_flow_type(mut self, flow_type: FlowType) -> Self {
        self.flow_type = flow_type;
        self
    }

    fn verifier_key(&self) -> String {
        format!("{}-code-verifier", self.storage_key)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn load_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(raw) = self.storage.load(&self.storage_key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored session");
                self.storage.remove(&self.storage_key)?;
                Ok(None)
            }
        }
    }

    fn persist(&self, session: &Session) -> Result<(), AuthError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize session: {e}")))?;
        self.storage.save(&self.storage_key, &raw)
    }

    // =========================================================================
    // HTTP
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User, AuthError> {
        let response = self
            .http
            .get(self.url("/auth/v1/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let err = api_error(status, &response.text().await.unwrap_or_default());
            return Err(AuthError::InvalidTokens(err.to_string()));
        }
        if !status.is_success() {
            return Err(api_error(status, &response.text().await.unwrap_or_default()));
        }
        Ok(response.json::<User>().await?)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        let token: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {e}")))?;
        Ok(token.into_session())
    }

    async fn refresh_with(&self, refresh_token: &str) -> Result<Session, AuthError> {
        debug!("Refreshing session");
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }
}

#[async_trait::async_trait]
impl SessionStore for SupabaseSessionStore {
    #[instrument(skip(self))]
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.load_session()? else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        debug!("Stored session expired");
        let refreshed = self.refresh_with(&session.refresh_token).await?;
        self.persist(&refreshed)?;
        Ok(Some(refreshed))
    }

    #[instrument(skip_all)]
    async fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Session, AuthError> {
        if access_token.is_empty() || refresh_token.is_empty() {
            return Err(AuthError::InvalidTokens(
                "access and refresh token are both required".to_string(),
            ));
        }

        let expires_at = jwt_expiry(access_token);
        let expired = expires_at
            .map(|exp| exp <= chrono::Utc::now().timestamp() + EXPIRY_MARGIN_SECS)
            .unwrap_or(false);

        let session = if expired {
            self.refresh_with(refresh_token).await?
        } else {
            let user = self.fetch_user(access_token).await?;
            Session {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.to_string(),
                expires_at,
                token_type: "bearer".to_string(),
                user,
            }
        };

        self.persist(&session)?;
        debug!(user_id = %session.user.id, "Session set");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn refresh_session(&self) -> Result<Session, AuthError> {
        let current = self.load_session()?.ok_or(AuthError::NoSession)?;
        let session = self.refresh_with(&current.refresh_token).await?;
        self.persist(&session)?;
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<String, AuthError> {
        if provider.is_empty() {
            return Err(AuthError::Other("Provider must not be empty".to_string()));
        }

        let mut url = url::Url::parse(&self.url("/auth/v1/authorize"))
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {e}")))?;

        let pkce = match self.flow_type {
            FlowType::Pkce => {
                let pkce = Pkce::generate();
                self.storage.save(&self.verifier_key(), &pkce.verifier)?;
                Some(pkce)
            }
            FlowType::Implicit => None,
        };

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("provider", provider);
            query.append_pair("redirect_to", redirect_to);
            if let Some(pkce) = &pkce {
                query.append_pair("code_challenge", &pkce.challenge);
                query.append_pair("code_challenge_method", PKCE_METHOD);
            }
        }

        debug!(flow = %self.flow_type, "Built authorize URL");
        Ok(url.into())
    }

    #[instrument(skip_all)]
    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        let verifier = self
            .storage
            .load(&self.verifier_key())?
            .ok_or(AuthError::MissingCodeVerifier)?;

        let session = self
            .token_grant(
                "pkce",
                serde_json::json!({ "auth_code": code, "code_verifier": verifier }),
            )
            .await?;

        // Verifiers are single-use.
        self.storage.remove(&self.verifier_key())?;
        self.persist(&session)?;
        Ok(session)
    }

    fn name(&self) -> &str {
        "supabase"
    }
}

/// Token response from `/auth/v1/token`.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|ei| chrono::Utc::now().timestamp() + ei));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            user: self.user,
        }
    }
}

/// The Auth API has used several error shapes over time.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn api_error(status: StatusCode, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.error_description.or(e.msg).or(e.message).or(e.error))
        .unwrap_or_else(|| body.to_string());
    AuthError::Api {
        status: status.as_u16(),
        message,
    }
}

/// `exp` claim of a JWT, without verifying it.
fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u","exp":{exp}}}"#));
        format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
    }

    #[test]
    fn test_jwt_expiry() {
        assert_eq!(jwt_expiry(&jwt_with_exp(1_700_000_000)), Some(1_700_000_000));
        assert_eq!(jwt_expiry("not-a-jwt"), None);
        assert_eq!(jwt_expiry("a.%%%.c"), None);
    }

    #[test]
    fn test_api_error_shapes() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid Refresh Token"}"#,
        );
        assert!(matches!(err, AuthError::Api { status: 400, ref message } if message == "Invalid Refresh Token"));

        let err = api_error(StatusCode::UNAUTHORIZED, r#"{"code":401,"msg":"invalid JWT"}"#);
        assert!(matches!(err, AuthError::Api { ref message, .. } if message == "invalid JWT"));

        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, AuthError::Api { status: 502, ref message } if message == "upstream down"));
    }

    #[test]
    fn test_storage_keys() {
        let store = SupabaseSessionStore::new(
            "https://abcd.supabase.co/",
            "anon",
            Arc::new(MemorySessionStorage::new()),
            "sb-abcd-auth-token",
            &HttpClient::new(),
        );
        assert_eq!(store.url("/auth/v1/user"), "https://abcd.supabase.co/auth/v1/user");
        assert_eq!(store.verifier_key(), "sb-abcd-auth-token-code-verifier");
    }

    #[test]
    fn test_corrupt_stored_session_is_discarded() {
        let storage = MemorySessionStorage::with_value("key", "{not json");
        let store = SupabaseSessionStore::new(
            "https://abcd.supabase.co",
            "anon",
            Arc::new(storage.clone()),
            "key",
            &HttpClient::new(),
        );
        assert!(store.load_session().unwrap().is_none());
        assert!(storage.is_empty());
    }
}
