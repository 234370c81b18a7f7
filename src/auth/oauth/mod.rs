//! OAuth sign-in and callback handling.
//!
//! The three callback pages (Kakao, Apple, generic deep-link) share one
//! flow, [`CallbackPage`], parameterized by a [`ProviderStrategy`].

pub mod callback;
pub mod deeplink;
pub mod latch;
pub mod params;
pub mod pkce;
pub mod signin;
pub mod status;
pub mod strategy;

// Re-exports
pub use callback::{CallbackOutcome, CallbackPage, CallbackReconciler, CallbackSettings};
pub use deeplink::{build_deep_link, is_app_redirect_host};
pub use latch::OneShotLatch;
pub use params::{DEFAULT_REDIRECT_TARGET, RedirectContext};
pub use pkce::Pkce;
pub use signin::start_sign_in;
pub use status::{CallbackStatus, CallbackView, StatusCell};
pub use strategy::{ParamSource, Provider, ProviderStrategy};
