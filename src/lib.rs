pub mod auth;
pub mod config;
pub mod error;
pub mod nav;
pub mod net;
pub mod notify;
pub mod web;

use crate::auth::RedirectResolver;
use crate::auth::oauth::{CallbackReconciler, CallbackSettings};
use crate::auth::supabase::SupabaseSessionStore;
use crate::auth::traits::SessionStore;
use crate::config::Config;
use crate::nav::Navigator;
use crate::net::HttpClient;
use crate::notify::{EdgeFunctionNotifier, NotificationSink};

use std::sync::Arc;

/// Process-wide collaborators shared by every page.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: HttpClient,
    pub store: Arc<dyn SessionStore>,
    pub notifier: Option<Arc<dyn NotificationSink>>,
    pub resolver: RedirectResolver,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let http = HttpClient::new();
        let store: Arc<dyn SessionStore> = Arc::new(SupabaseSessionStore::from_config(&config, &http));
        let notifier: Option<Arc<dyn NotificationSink>> = if config.notify.enabled {
            Some(Arc::new(EdgeFunctionNotifier::from_config(&config)))
        } else {
            None
        };
        Self {
            resolver: RedirectResolver::from_config(&config.app),
            config: Arc::new(config),
            http,
            store,
            notifier,
        }
    }

    /// Callback flow wired to this state's store and notifier.
    pub fn reconciler(&self, navigator: Arc<dyn Navigator>) -> CallbackReconciler {
        let reconciler = CallbackReconciler::new(
            Arc::clone(&self.store),
            navigator,
            CallbackSettings::from_config(&self.config),
        );
        match &self.notifier {
            Some(notifier) => reconciler.with_notifier(Arc::clone(notifier)),
            None => reconciler,
        }
    }
}
