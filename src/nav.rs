//! Navigation seam.
//!
//! The host shell (browser, WebView, CLI) decides what "going somewhere"
//! means. The sign-in flow only asks.

/// Failure to hand a URL to the platform.
#[derive(Debug, thiserror::Error)]
#[error("Failed to open {url}: {reason}")]
pub struct NavError {
    pub url: String,
    pub reason: String,
}

#[async_trait::async_trait]
pub trait Navigator: Send + Sync {
    /// Replace the current in-app route with `path`.
    fn navigate(&self, path: &str);

    /// Open a URL outside the app: an OAuth authorize page or a
    /// custom-scheme deep link.
    async fn open_external(&self, url: &str) -> Result<(), NavError>;
}

/// Where a finished callback sent the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// In-app route.
    InApp(String),
    /// Custom-scheme deep link into the packaged app.
    DeepLink(String),
    /// The deep link failed to open; fell back to the in-app route.
    DeepLinkFallback(String),
}
