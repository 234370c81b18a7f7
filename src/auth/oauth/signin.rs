//! Starting a provider sign-in.

use tracing::{info, instrument};

use super::strategy::Provider;
use crate::auth::error::AuthError;
use crate::auth::redirect::{RedirectResolver, RuntimeEnv};
use crate::auth::traits::SessionStore;
use crate::nav::Navigator;

/// Send the user agent to `provider`'s authorization page.
///
/// The redirect URL comes from [`RedirectResolver`], so a packaged app is
/// always sent back to the production web origin. Returns the authorize URL
/// that was opened.
#[instrument(skip_all, fields(provider = %provider))]
pub async fn start_sign_in(
    store: &dyn SessionStore,
    navigator: &dyn Navigator,
    resolver: &RedirectResolver,
    provider: Provider,
    env: &RuntimeEnv,
) -> Result<String, AuthError> {
    let redirect_to = resolver.resolve(env, provider.callback_path());
    let authorize_url = store
        .sign_in_with_oauth(provider.as_str(), &redirect_to)
        .await?;

    navigator
        .open_external(&authorize_url)
        .await
        .map_err(|e| AuthError::Other(e.to_string()))?;

    info!(redirect_to = %redirect_to, "Opened provider sign-in");
    Ok(authorize_url)
}
