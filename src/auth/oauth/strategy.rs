//! Per-provider callback behavior.
//!
//! The Kakao, Apple and generic deep-link callback pages run the same
//! reconciliation flow. What differs is where the auth parameters may appear
//! and which session sources are worth trying, captured here as data.

use std::str::FromStr;

use crate::auth::redirect::{APPLE_CALLBACK_PATH, KAKAO_CALLBACK_PATH};

/// Supported OAuth identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Kakao,
    Apple,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kakao => "kakao",
            Self::Apple => "apple",
        }
    }

    /// Path of the callback page the provider redirects to.
    pub fn callback_path(&self) -> &'static str {
        match self {
            Self::Kakao => KAKAO_CALLBACK_PATH,
            Self::Apple => APPLE_CALLBACK_PATH,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kakao" => Ok(Self::Kakao),
            "apple" => Ok(Self::Apple),
            _ => Err(format!("Unknown provider: {s}")),
        }
    }
}

/// Where auth parameters (`access_token`, `error`, ...) are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    FragmentOnly,
    /// Both, fragment values winning on conflict.
    FragmentOrQuery,
}

/// Provider used by the deep-link page when no `provider` query parameter is given.
pub const DEFAULT_DEEP_LINK_PROVIDER: &str = "kakao";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStrategy {
    /// Fixed provider, or `None` to read it from the `provider` query parameter.
    pub provider: Option<Provider>,
    pub param_source: ParamSource,
    /// Establish the session from tokens delivered in the redirect.
    pub accept_direct_tokens: bool,
    /// Exchange a PKCE `code` for a session.
    pub exchange_code: bool,
    /// Poll the store for a session established out of band.
    pub poll_existing: bool,
    pub attempt_refresh: bool,
}

impl ProviderStrategy {
    /// Kakao places parameters in either the fragment or the query.
    pub fn kakao() -> Self {
        Self {
            provider: Some(Provider::Kakao),
            param_source: ParamSource::FragmentOrQuery,
            accept_direct_tokens: true,
            exchange_code: true,
            poll_existing: true,
            attempt_refresh: true,
        }
    }

    /// Apple's redirect goes through the auth service's form-post handler,
    /// which always answers with a fragment.
    pub fn apple() -> Self {
        Self {
            provider: Some(Provider::Apple),
            param_source: ParamSource::FragmentOnly,
            accept_direct_tokens: true,
            exchange_code: false,
            poll_existing: true,
            attempt_refresh: true,
        }
    }

    /// Generic `/auth/callback` page reached from the app shell.
    pub fn deep_link() -> Self {
        Self {
            provider: None,
            param_source: ParamSource::FragmentOrQuery,
            accept_direct_tokens: true,
            exchange_code: true,
            poll_existing: true,
            attempt_refresh: true,
        }
    }

    /// Pick the strategy for a callback page path.
    pub fn for_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            KAKAO_CALLBACK_PATH => Self::kakao(),
            APPLE_CALLBACK_PATH => Self::apple(),
            _ => Self::deep_link(),
        }
    }
}
