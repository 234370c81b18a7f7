//! OAuth callback reconciliation.
//!
//! One [`CallbackPage`] exists per mounted callback page. It parses the
//! redirect, resolves a session through the [`SessionStore`], sends the
//! best-effort login notification and finally navigates: into the packaged
//! app via deep link, in-app to the `next` target, or back to sign-up on
//! failure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::deeplink::{build_deep_link, is_app_redirect_host};
use super::latch::OneShotLatch;
use super::params::RedirectContext;
use super::status::{CallbackStatus, CallbackView, StatusCell};
use super::strategy::ProviderStrategy;
use crate::auth::error::AuthError;
use crate::auth::session::Session;
use crate::auth::traits::SessionStore;
use crate::config::{CallbackConfig, Config};
use crate::error::CallbackError;
use crate::nav::{Navigation, Navigator};
use crate::notify::{LoginNotification, NotificationSink};

/// Product settings the callback flow needs.
#[derive(Debug, Clone)]
pub struct CallbackSettings {
    pub delays: CallbackConfig,
    pub deep_link_scheme: String,
    /// Hosts whose callback pages hand the session to the packaged app.
    pub web_hosts: Vec<String>,
    pub signup_path: String,
    pub notify_role: String,
    /// Upper bound on the login notification before the flow moves on.
    pub notify_timeout: Duration,
}

impl CallbackSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            delays: config.callback.clone(),
            deep_link_scheme: config.app.deep_link_scheme.clone(),
            web_hosts: config.app.web_hosts.clone(),
            signup_path: config.app.signup_path.clone(),
            notify_role: config.notify.role.clone(),
            notify_timeout: Duration::from_secs(config.notify.timeout_secs),
        }
    }

    pub fn with_delays(mut self, delays: CallbackConfig) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }
}

impl Default for CallbackSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Provider-independent session resolution.
pub struct CallbackReconciler {
    store: Arc<dyn SessionStore>,
    notifier: Option<Arc<dyn NotificationSink>>,
    navigator: Arc<dyn Navigator>,
    settings: CallbackSettings,
}

impl CallbackReconciler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        settings: CallbackSettings,
    ) -> Self {
        Self {
            store,
            notifier: None,
            navigator,
            settings,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Turn a parsed redirect into an established session.
    ///
    /// An explicit provider error wins over everything else and is reported
    /// before the store is touched.
    #[instrument(skip_all, fields(provider = %ctx.provider))]
    pub async fn reconcile(
        &self,
        ctx: &RedirectContext,
        strategy: &ProviderStrategy,
    ) -> Result<Session, CallbackError> {
        if let Some(code) = &ctx.error {
            return Err(CallbackError::ProviderReported {
                code: code.clone(),
                description: ctx.error_description.clone(),
            });
        }

        let resolved = self.resolve_session(ctx, strategy).await?;

        let session = self
            .store
            .set_session(&resolved.access_token, &resolved.refresh_token)
            .await
            .map_err(CallbackError::SessionEstablishment)?;
        if !session.is_complete() {
            return Err(CallbackError::SessionEstablishment(AuthError::InvalidTokens(
                "store returned a session without tokens".to_string(),
            )));
        }

        self.notify(&session).await;
        Ok(session)
    }

    async fn resolve_session(
        &self,
        ctx: &RedirectContext,
        strategy: &ProviderStrategy,
    ) -> Result<Session, CallbackError> {
        if let Some((access, refresh)) = ctx.tokens().filter(|_| strategy.accept_direct_tokens) {
            let result = self.store.set_session(access, refresh).await.map(Some);
            if let Some(session) = complete("redirect tokens", result) {
                return Ok(session);
            }
        }

        if let Some(code) = ctx.code.as_deref().filter(|_| strategy.exchange_code) {
            let result = self.store.exchange_code_for_session(code).await.map(Some);
            if let Some(session) = complete("code exchange", result) {
                return Ok(session);
            }
        }

        if strategy.poll_existing {
            pause(self.settings.delays.settle_delay()).await;
            if let Some(session) = complete("existing session", self.store.get_session().await) {
                return Ok(session);
            }
        }

        if strategy.attempt_refresh {
            let result = self.store.refresh_session().await.map(Some);
            if let Some(session) = complete("refresh", result) {
                return Ok(session);
            }
        }

        Err(CallbackError::MissingSession)
    }

    /// Failures and timeouts are logged and swallowed.
    async fn notify(&self, session: &Session) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let notice = LoginNotification::from_session(session, &self.settings.notify_role);
        let sent = tokio::time::timeout(
            self.settings.notify_timeout,
            notifier.notify(&notice, &session.access_token),
        )
        .await;
        match sent {
            Ok(Ok(())) => debug!(user_id = %notice.id, "Login notification sent"),
            Ok(Err(e)) => warn!(user_id = %notice.id, error = %e, "Login notification failed"),
            Err(_) => warn!(
                user_id = %notice.id,
                timeout_ms = self.settings.notify_timeout.as_millis() as u64,
                "Login notification timed out"
            ),
        }
    }
}

/// A session from one resolution step, if it carries both tokens.
fn complete(step: &str, result: Result<Option<Session>, AuthError>) -> Option<Session> {
    match result {
        Ok(Some(session)) if session.is_complete() => {
            debug!(step, user_id = %session.user.id, "Session resolved");
            Some(session)
        }
        Ok(Some(_)) => {
            warn!(step, "Session is missing a token");
            None
        }
        Ok(None) => {
            debug!(step, "No session");
            None
        }
        Err(e) => {
            warn!(step, error = %e, "Session step failed");
            None
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Result of a completed [`CallbackPage::mount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub status: CallbackStatus,
    pub message: Option<String>,
    /// `None` if the page was unmounted before navigating.
    pub navigation: Option<Navigation>,
}

/// State of one mounted callback page.
pub struct CallbackPage {
    strategy: ProviderStrategy,
    reconciler: Arc<CallbackReconciler>,
    latch: OneShotLatch,
    status: StatusCell,
    alive: AtomicBool,
}

impl CallbackPage {
    pub fn new(strategy: ProviderStrategy, reconciler: Arc<CallbackReconciler>) -> Self {
        let provider = strategy
            .provider
            .map(|p| p.as_str())
            .unwrap_or(super::strategy::DEFAULT_DEEP_LINK_PROVIDER);
        Self {
            status: StatusCell::new(provider),
            strategy,
            reconciler,
            latch: OneShotLatch::new(),
            alive: AtomicBool::new(true),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CallbackView> {
        self.status.subscribe()
    }

    pub fn view(&self) -> CallbackView {
        self.status.current()
    }

    /// Tear the page down. Pending continuations stop touching state
    /// and navigation.
    pub fn unmount(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_mounted(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Run the callback flow for `url`.
    ///
    /// Returns `None` for every call after the first.
    pub async fn mount(&self, url: &Url) -> Option<CallbackOutcome> {
        if !self.latch.try_fire() {
            debug!("Callback already handled, ignoring mount");
            return None;
        }

        let ctx = RedirectContext::parse(url, &self.strategy);
        self.status.set_provider(&ctx.provider);

        let outcome = match self.reconciler.reconcile(&ctx, &self.strategy).await {
            Ok(session) => {
                info!(provider = %ctx.provider, user_id = %session.user.id, "Sign-in completed");
                let navigation = self.on_success(url, &ctx, &session).await;
                CallbackOutcome {
                    status: CallbackStatus::Success,
                    message: None,
                    navigation,
                }
            }
            Err(err) => {
                warn!(provider = %ctx.provider, kind = err.kind(), error = %err, "Sign-in failed");
                let message = err.user_message();
                let navigation = self.on_error(&message).await;
                CallbackOutcome {
                    status: CallbackStatus::Error,
                    message: Some(message),
                    navigation,
                }
            }
        };
        Some(outcome)
    }

    async fn on_success(
        &self,
        url: &Url,
        ctx: &RedirectContext,
        session: &Session,
    ) -> Option<Navigation> {
        let settings = &self.reconciler.settings;
        let target = ctx.redirect_target().to_string();
        if !self.is_mounted() {
            return None;
        }
        self.status.succeed(&target);

        let from_app_host = url
            .host_str()
            .is_some_and(|host| is_app_redirect_host(host, &settings.web_hosts));

        if from_app_host {
            let link = build_deep_link(
                &settings.deep_link_scheme,
                &session.access_token,
                &session.refresh_token,
                &target,
            );
            match self.reconciler.navigator.open_external(&link).await {
                Ok(()) => {
                    debug!(next = %target, "Handed session to app via deep link");
                    return Some(Navigation::DeepLink(link));
                }
                Err(e) => {
                    warn!(error = %e.reason, "Deep link failed, staying in web app");
                    pause(settings.delays.deep_link_fallback_delay()).await;
                    return self
                        .navigate(&target)
                        .then(|| Navigation::DeepLinkFallback(target));
                }
            }
        }

        pause(settings.delays.success_redirect_delay()).await;
        self.navigate(&target).then(|| Navigation::InApp(target))
    }

    async fn on_error(&self, message: &str) -> Option<Navigation> {
        let settings = &self.reconciler.settings;
        if !self.is_mounted() {
            return None;
        }
        self.status.fail(message);

        pause(settings.delays.error_redirect_delay()).await;
        let signup = settings.signup_path.clone();
        self.navigate(&signup).then(|| Navigation::InApp(signup))
    }

    fn navigate(&self, path: &str) -> bool {
        if !self.is_mounted() {
            debug!(path, "Page unmounted, skipping navigation");
            return false;
        }
        self.reconciler.navigator.navigate(path);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::User;

    #[test]
    fn test_complete_requires_both_tokens() {
        let full = Session::new("at", "rt", User::new("u"));
        assert!(complete("test", Ok(Some(full))).is_some());

        let partial = Session::new("at", "", User::new("u"));
        assert!(complete("test", Ok(Some(partial))).is_none());
        assert!(complete("test", Ok(None)).is_none());
        assert!(complete("test", Err(AuthError::NoSession)).is_none());
    }

    #[test]
    fn test_settings_from_config() {
        let settings = CallbackSettings::default();
        assert_eq!(settings.deep_link_scheme, "wehand");
        assert_eq!(settings.signup_path, "/signup");
        assert_eq!(settings.notify_role, "user");
        assert_eq!(settings.notify_timeout, Duration::from_secs(10));
        assert!(settings.delays.error_redirect_delay() > settings.delays.success_redirect_delay());

        let settings = settings.with_delays(CallbackConfig::immediate());
        assert!(settings.delays.settle_delay().is_zero());
    }
}
