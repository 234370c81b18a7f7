//! Scripted collaborators for the callback and sign-in flows.
//!
//! Each mock records every call it receives so tests can assert on exactly
//! which network-affecting operations ran, and in which order.

#![allow(dead_code)]

use std::sync::Mutex;

use wehand_auth::auth::error::AuthError;
use wehand_auth::auth::session::{Session, User};
use wehand_auth::auth::traits::SessionStore;
use wehand_auth::nav::{NavError, Navigator};
use wehand_auth::notify::{LoginNotification, NotificationSink, NotifyError};

pub fn user() -> User {
    let mut user = User::new("user-1")
        .with_email("player@wehand.app")
        .with_provider("kakao");
    user.user_metadata.full_name = Some("김테니스".into());
    user.user_metadata.name = Some("tennis".into());
    user
}

pub fn session(access: &str, refresh: &str) -> Session {
    Session::new(access, refresh, user())
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetSession,
    SetSession(String, String),
    Refresh,
    SignIn(String, String),
    Exchange(String),
}

/// How `set_session` answers.
#[derive(Debug, Clone)]
pub enum SetBehavior {
    /// Return a session carrying the given tokens.
    Echo,
    /// Return a session with these rotated tokens.
    Rotate(String, String),
    Fail,
}

pub struct MockStore {
    calls: Mutex<Vec<StoreCall>>,
    pub set_behavior: SetBehavior,
    pub existing: Option<Session>,
    pub refreshed: Option<Session>,
    pub exchanged: Option<Session>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            set_behavior: SetBehavior::Echo,
            existing: None,
            refreshed: None,
            exchanged: None,
        }
    }

    pub fn with_set_behavior(mut self, behavior: SetBehavior) -> Self {
        self.set_behavior = behavior;
        self
    }

    pub fn with_existing(mut self, session: Session) -> Self {
        self.existing = Some(session);
        self
    }

    pub fn with_refreshed(mut self, session: Session) -> Self {
        self.refreshed = Some(session);
        self
    }

    pub fn with_exchanged(mut self, session: Session) -> Self {
        self.exchanged = Some(session);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl SessionStore for MockStore {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        self.record(StoreCall::GetSession);
        Ok(self.existing.clone())
    }

    async fn set_session(&self, access: &str, refresh: &str) -> Result<Session, AuthError> {
        self.record(StoreCall::SetSession(access.into(), refresh.into()));
        match &self.set_behavior {
            SetBehavior::Echo => Ok(session(access, refresh)),
            SetBehavior::Rotate(a, r) => Ok(session(a, r)),
            SetBehavior::Fail => Err(AuthError::InvalidTokens("rejected".into())),
        }
    }

    async fn refresh_session(&self) -> Result<Session, AuthError> {
        self.record(StoreCall::Refresh);
        self.refreshed.clone().ok_or(AuthError::NoSession)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: &str,
        redirect_to: &str,
    ) -> Result<String, AuthError> {
        self.record(StoreCall::SignIn(provider.into(), redirect_to.into()));
        Ok(format!(
            "https://auth.example.com/authorize?provider={provider}&redirect_to={}",
            urlencoding::encode(redirect_to)
        ))
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, AuthError> {
        self.record(StoreCall::Exchange(code.into()));
        self.exchanged.clone().ok_or(AuthError::MissingCodeVerifier)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Notification sink
// ---------------------------------------------------------------------------

pub struct MockNotifier {
    notices: Mutex<Vec<(LoginNotification, String)>>,
    pub fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn notices(&self) -> Vec<(LoginNotification, String)> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationSink for MockNotifier {
    async fn notify(
        &self,
        notice: &LoginNotification,
        access_token: &str,
    ) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .unwrap()
            .push((notice.clone(), access_token.to_string()));
        if self.fail {
            return Err(NotifyError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }
}

/// A sink whose request never completes.
pub struct HangingNotifier;

#[async_trait::async_trait]
impl NotificationSink for HangingNotifier {
    async fn notify(&self, _: &LoginNotification, _: &str) -> Result<(), NotifyError> {
        std::future::pending().await
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCall {
    Navigate(String),
    External(String),
}

pub struct MockNavigator {
    calls: Mutex<Vec<NavCall>>,
    pub fail_external: bool,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_external: false,
        }
    }

    pub fn failing_external() -> Self {
        Self {
            fail_external: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<NavCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Navigator for MockNavigator {
    fn navigate(&self, path: &str) {
        self.calls.lock().unwrap().push(NavCall::Navigate(path.into()));
    }

    async fn open_external(&self, url: &str) -> Result<(), NavError> {
        self.calls.lock().unwrap().push(NavCall::External(url.into()));
        if self.fail_external {
            return Err(NavError {
                url: url.into(),
                reason: "no handler for scheme".into(),
            });
        }
        Ok(())
    }
}
