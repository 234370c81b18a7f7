//! Callback status state machine.
//!
//! `Loading -> Success` or `Loading -> Error`. Both are terminal: once left,
//! `Loading` is never re-entered and the terminal state never changes.

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Loading,
    Success,
    Error,
}

impl CallbackStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackView {
    pub status: CallbackStatus,
    pub provider: String,
    /// Error message shown to the user.
    pub message: Option<String>,
    /// Post-login target, once known.
    pub redirect_to: Option<String>,
}

impl CallbackView {
    pub fn loading(provider: impl Into<String>) -> Self {
        Self {
            status: CallbackStatus::Loading,
            provider: provider.into(),
            message: None,
            redirect_to: None,
        }
    }
}

/// Holds the current [`CallbackView`] and publishes changes to subscribers.
#[derive(Debug)]
pub struct StatusCell {
    tx: watch::Sender<CallbackView>,
}

impl StatusCell {
    pub fn new(provider: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(CallbackView::loading(provider));
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<CallbackView> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> CallbackView {
        self.tx.borrow().clone()
    }

    /// Record the provider once it is known from the redirect.
    pub fn set_provider(&self, provider: &str) {
        self.tx.send_if_modified(|view| {
            if view.status.is_terminal() || view.provider == provider {
                return false;
            }
            view.provider = provider.to_string();
            true
        });
    }

    /// `Loading -> Success`. Returns `false` if the state was already terminal.
    pub fn succeed(&self, redirect_to: &str) -> bool {
        self.tx.send_if_modified(|view| {
            if view.status.is_terminal() {
                return false;
            }
            view.status = CallbackStatus::Success;
            view.redirect_to = Some(redirect_to.to_string());
            true
        })
    }

    /// `Loading -> Error`. Returns `false` if the state was already terminal.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.tx.send_if_modified(|view| {
            if view.status.is_terminal() {
                return false;
            }
            view.status = CallbackStatus::Error;
            view.message = Some(message);
            true
        })
    }
}
