//! Redirect parameter extraction.
//!
//! Providers are inconsistent about where they put the auth response: the
//! implicit flow uses the URL fragment, error redirects and PKCE codes use
//! the query string, and some do both. [`RedirectContext`] reads both once
//! and merges them according to the provider's [`ParamSource`].

use std::collections::HashMap;

use url::Url;

use super::strategy::{DEFAULT_DEEP_LINK_PROVIDER, ParamSource, ProviderStrategy};

/// Default post-login target.
pub const DEFAULT_REDIRECT_TARGET: &str = "/";

/// Parameters of one callback invocation. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectContext {
    pub fragment: String,
    pub query: String,
    pub provider: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// PKCE authorization code.
    pub code: Option<String>,
    pub next: Option<String>,
}

impl RedirectContext {
    pub fn parse(url: &Url, strategy: &ProviderStrategy) -> Self {
        let fragment = url.fragment().unwrap_or_default().to_string();
        let query = url.query().unwrap_or_default().to_string();

        let fragment_params = parse_pairs(&fragment);
        let query_params = parse_pairs(&query);

        let auth_param = |name: &str| -> Option<String> {
            let from_fragment = fragment_params.get(name).cloned();
            match strategy.param_source {
                ParamSource::FragmentOnly => from_fragment,
                ParamSource::FragmentOrQuery => {
                    from_fragment.or_else(|| query_params.get(name).cloned())
                }
            }
        };

        let provider = match strategy.provider {
            Some(p) => p.as_str().to_string(),
            None => query_params
                .get("provider")
                .cloned()
                .unwrap_or_else(|| DEFAULT_DEEP_LINK_PROVIDER.to_string()),
        };

        Self {
            provider,
            error: auth_param("error"),
            error_description: auth_param("error_description"),
            access_token: auth_param("access_token"),
            refresh_token: auth_param("refresh_token"),
            code: auth_param("code"),
            next: query_params.get("next").cloned(),
            fragment,
            query,
        }
    }

    /// Both tokens, when the redirect delivered them directly.
    pub fn tokens(&self) -> Option<(&str, &str)> {
        match (self.access_token.as_deref(), self.refresh_token.as_deref()) {
            (Some(access), Some(refresh)) => Some((access, refresh)),
            _ => None,
        }
    }

    /// Where to go after a successful sign-in.
    ///
    /// Only same-app paths are honored; absolute and protocol-relative URLs
    /// fall back to the root.
    pub fn redirect_target(&self) -> &str {
        match self.next.as_deref() {
            Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
            _ => DEFAULT_REDIRECT_TARGET,
        }
    }
}

/// Decode `a=1&b=2` pairs. Empty values count as absent; the first
/// occurrence of a name wins.
fn parse_pairs(raw: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        if value.is_empty() {
            continue;
        }
        map.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    map
}
