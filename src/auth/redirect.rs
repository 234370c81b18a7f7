//! Redirect URL resolution for OAuth sign-in.
//!
//! Inside the packaged app shell the page runs under an in-app origin
//! (`capacitor://localhost`, `http://localhost`, `file://`) that an OAuth
//! provider cannot redirect back to. In that case the redirect goes to the
//! production web origin instead, and the callback page there bounces back
//! into the app via deep link.

use crate::config::AppConfig;

/// Path of the Kakao callback page.
pub const KAKAO_CALLBACK_PATH: &str = "/auth/kakao/callback";

/// Path of the Apple callback page.
pub const APPLE_CALLBACK_PATH: &str = "/auth/apple/callback";

/// Ambient runtime signals of the page doing the sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnv {
    /// URL scheme without the trailing `:` (`https`, `capacitor`, ...).
    pub scheme: String,
    /// Host name without port.
    pub host: String,
    /// Serialized origin, `scheme://host[:port]`.
    pub origin: String,
    /// The platform reports standalone display mode (installed PWA / shell).
    pub standalone: bool,
    pub user_agent: String,
}

impl RuntimeEnv {
    /// Derive the signals from the current page URL.
    pub fn from_page_url(
        page_url: &str,
        standalone: bool,
        user_agent: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let url = url::Url::parse(page_url)?;
        let scheme = url.scheme().to_string();
        let host = url.host_str().unwrap_or_default().to_string();

        // Non-special schemes have an opaque origin in the URL standard,
        // so build it by hand for those.
        let origin = match url.origin() {
            origin @ url::Origin::Tuple(..) => origin.ascii_serialization(),
            url::Origin::Opaque(_) => match url.port() {
                Some(port) => format!("{scheme}://{host}:{port}"),
                None => format!("{scheme}://{host}"),
            },
        };

        Ok(Self {
            scheme,
            host,
            origin,
            standalone,
            user_agent: user_agent.into(),
        })
    }
}

/// Decides where OAuth providers should send the user back to.
#[derive(Debug, Clone)]
pub struct RedirectResolver {
    web_origin: String,
    packaged_schemes: Vec<String>,
}

impl RedirectResolver {
    pub fn new(web_origin: impl Into<String>, packaged_schemes: Vec<String>) -> Self {
        Self {
            web_origin: web_origin.into().trim_end_matches('/').to_string(),
            packaged_schemes,
        }
    }

    pub fn from_config(app: &AppConfig) -> Self {
        Self::new(app.web_origin.clone(), app.packaged_schemes.clone())
    }

    pub fn web_origin(&self) -> &str {
        &self.web_origin
    }

    /// Whether the page runs inside the packaged app rather than a browser.
    pub fn is_packaged_app(&self, env: &RuntimeEnv) -> bool {
        let scheme = env.scheme.to_ascii_lowercase();
        self.packaged_schemes.iter().any(|s| s.eq_ignore_ascii_case(&scheme))
            || scheme == "file"
            || (scheme == "http" && env.host.eq_ignore_ascii_case("localhost"))
            || env.standalone
            || is_embedded_webview(&env.user_agent)
    }

    /// Fully-qualified redirect URL for `path`.
    pub fn resolve(&self, env: &RuntimeEnv, path: &str) -> String {
        let base = if self.is_packaged_app(env) {
            self.web_origin.as_str()
        } else {
            env.origin.trim_end_matches('/')
        };
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Recognize embedded WebView user agents.
///
/// Android WebViews carry a `; wv)` token. iOS WKWebView reports
/// AppleWebKit on an iOS device but, unlike Safari, no `Safari/` token.
pub fn is_embedded_webview(user_agent: &str) -> bool {
    if user_agent.contains("; wv)") || user_agent.contains("WebView") {
        return true;
    }
    let ios = ["iPhone", "iPad", "iPod"].iter().any(|d| user_agent.contains(d));
    ios && user_agent.contains("AppleWebKit") && !user_agent.contains("Safari")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP_CHROME: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
    const IOS_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
    const IOS_WKWEBVIEW: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
    const ANDROID_WV: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/124.0 Mobile Safari/537.36";

    fn resolver() -> RedirectResolver {
        RedirectResolver::from_config(&AppConfig::default())
    }

    fn env(url: &str, standalone: bool, ua: &str) -> RuntimeEnv {
        RuntimeEnv::from_page_url(url, standalone, ua).unwrap()
    }

    #[test]
    fn test_runtime_env_from_page_url() {
        let e = env("https://staging.wehand.app:8443/signup?x=1", false, DESKTOP_CHROME);
        assert_eq!(e.scheme, "https");
        assert_eq!(e.host, "staging.wehand.app");
        assert_eq!(e.origin, "https://staging.wehand.app:8443");

        let e = env("capacitor://localhost/signup", false, "");
        assert_eq!(e.origin, "capacitor://localhost");
    }

    #[test]
    fn test_browser_uses_current_origin() {
        let e = env("https://staging.wehand.app/signup", false, DESKTOP_CHROME);
        assert_eq!(
            resolver().resolve(&e, KAKAO_CALLBACK_PATH),
            "https://staging.wehand.app/auth/kakao/callback"
        );

        let e = env("http://192.168.0.10:5173/", false, IOS_SAFARI);
        assert_eq!(
            resolver().resolve(&e, APPLE_CALLBACK_PATH),
            "http://192.168.0.10:5173/auth/apple/callback"
        );
    }

    #[test]
    fn test_packaged_signals_use_web_origin() {
        let cases = [
            env("capacitor://localhost/signup", false, DESKTOP_CHROME),
            env("ionic://localhost/", false, DESKTOP_CHROME),
            env("file:///android_asset/index.html", false, DESKTOP_CHROME),
            env("http://localhost/signup", false, DESKTOP_CHROME),
            env("https://staging.wehand.app/", true, DESKTOP_CHROME),
            env("https://staging.wehand.app/", false, ANDROID_WV),
            env("https://staging.wehand.app/", false, IOS_WKWEBVIEW),
        ];
        for e in cases {
            assert!(resolver().is_packaged_app(&e), "{e:?}");
            assert_eq!(
                resolver().resolve(&e, KAKAO_CALLBACK_PATH),
                "https://wehand.app/auth/kakao/callback"
            );
        }
    }

    #[test]
    fn test_https_localhost_is_browser() {
        let e = env("https://localhost:3000/", false, DESKTOP_CHROME);
        assert!(!resolver().is_packaged_app(&e));
    }

    #[test]
    fn test_webview_detection() {
        assert!(is_embedded_webview(ANDROID_WV));
        assert!(is_embedded_webview(IOS_WKWEBVIEW));
        assert!(!is_embedded_webview(IOS_SAFARI));
        assert!(!is_embedded_webview(DESKTOP_CHROME));
        assert!(!is_embedded_webview(""));
    }

    #[test]
    fn test_relative_path_without_slash() {
        let r = RedirectResolver::new("https://wehand.app/", vec![]);
        let e = env("file:///index.html", false, "");
        assert_eq!(r.resolve(&e, "auth/kakao/callback"), "https://wehand.app/auth/kakao/callback");
    }
}
