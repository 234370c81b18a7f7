//! Notification via a hosted edge function.

use std::time::Duration;

use tracing::{debug, instrument};

use super::{LoginNotification, NotificationSink, NotifyError};
use crate::config::Config;
use crate::net::HttpClient;

/// Invokes `POST {project_url}/functions/v1/{function_name}`.
///
/// Requests are bounded by the timeout of the client it is given.
#[derive(Debug, Clone)]
pub struct EdgeFunctionNotifier {
    endpoint: String,
    anon_key: String,
    http: reqwest::Client,
}

impl EdgeFunctionNotifier {
    pub fn new(
        project_url: &str,
        anon_key: impl Into<String>,
        function_name: &str,
        http: &HttpClient,
    ) -> Self {
        Self {
            endpoint: format!(
                "{}/functions/v1/{}",
                project_url.trim_end_matches('/'),
                function_name
            ),
            anon_key: anon_key.into(),
            http: http.inner().clone(),
        }
    }

    /// Notifier on a dedicated client bounded by `notify.timeout_secs`.
    pub fn from_config(config: &Config) -> Self {
        let http = HttpClient::with_request_timeout(Duration::from_secs(config.notify.timeout_secs));
        Self::new(
            &config.supabase.url,
            config.supabase.anon_key.clone(),
            &config.notify.function_name,
            &http,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl NotificationSink for EdgeFunctionNotifier {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, user_id = %notice.id))]
    async fn notify(
        &self,
        notice: &LoginNotification,
        access_token: &str,
    ) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .json(notice)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Login notification delivered");
        Ok(())
    }
}
