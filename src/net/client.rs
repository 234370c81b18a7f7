//! Shared HTTP client.

use reqwest::Client;
use std::time::Duration;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("wehand-auth/", env!("CARGO_PKG_VERSION"));

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Auth calls are small; anything slower is a hang.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `reqwest::Client` carrying the crate's user agent and a request deadline.
///
/// Cheap to clone. The session store uses [`HttpClient::new`]; the login
/// notifier gets its own client bounded by `notify.timeout_secs`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_request_timeout(REQUEST_TIMEOUT)
    }

    /// Client whose requests fail once `timeout` has elapsed. The connect
    /// phase never gets longer than the whole request.
    pub fn with_request_timeout(timeout: Duration) -> Self {
        let built = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build();
        let inner = match built {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build HTTP client; using reqwest defaults");
                Client::default()
            }
        };
        Self { inner }
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let resp = HttpClient::new().inner().get(server.uri()).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 204);
    }

    #[tokio::test]
    async fn test_request_timeout_applies_to_every_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = HttpClient::with_request_timeout(Duration::from_millis(100));
        let err = client.inner().get(server.uri()).send().await.unwrap_err();
        assert!(err.is_timeout());
    }
}
