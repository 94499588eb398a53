use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use tenantdesk_application::LastLoginNotifier;
use tenantdesk_core::{AppError, AppResult, UserId};

use crate::HostedAuthClient;

/// Calls the dashboard API's last-login route.
pub struct HttpLastLoginNotifier {
    http_client: reqwest::Client,
    endpoint: Url,
    auth: Arc<HostedAuthClient>,
}

impl HttpLastLoginNotifier {
    /// Creates a notifier for the API at `api_base_url`.
    pub fn new(
        http_client: reqwest::Client,
        api_base_url: &Url,
        auth: Arc<HostedAuthClient>,
    ) -> AppResult<Self> {
        let endpoint = api_base_url
            .join("api/update-last-login")
            .map_err(|error| AppError::Validation(format!("invalid api base url: {error}")))?;

        Ok(Self {
            http_client,
            endpoint,
            auth,
        })
    }
}

#[async_trait]
impl LastLoginNotifier for HttpLastLoginNotifier {
    async fn notify_last_login(&self, user_id: UserId) -> AppResult<()> {
        let access_token = self
            .auth
            .access_token()
            .await?
            .ok_or_else(|| AppError::Unauthorized("no stored credentials".to_owned()))?;

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "user_id": user_id }))
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("last login request failed: {error}")))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "last login route returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
