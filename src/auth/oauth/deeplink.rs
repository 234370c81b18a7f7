//! Deep links back into the packaged app.
//!
//! When the app shell sends the user to the production web origin for
//! OAuth, the callback page there hands the session to the app through a
//! custom-scheme URL:
//!
//! ```text
//! wehand://auth/callback?access_token=<t>&refresh_token=<t>&next=<path>
//! ```

/// Build the deep link carrying a session and the post-login target.
pub fn build_deep_link(scheme: &str, access_token: &str, refresh_token: &str, next: &str) -> String {
    format!(
        "{scheme}://auth/callback?access_token={}&refresh_token={}&next={}",
        urlencoding::encode(access_token),
        urlencoding::encode(refresh_token),
        urlencoding::encode(next),
    )
}

/// Whether a callback served from `host` must bounce into the app.
pub fn is_app_redirect_host(host: &str, web_hosts: &[String]) -> bool {
    !host.is_empty() && web_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
}
