//! Profile lookups through the hosted REST interface.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use tenantdesk_application::ProfileRepository;
use tenantdesk_core::{AppError, AppResult, UserId};
use tenantdesk_domain::Profile;

use crate::HostedAuthClient;

const PROFILE_COLUMNS: &str = "id,full_name,email,role,tenant_id,title,last_login";

/// REST implementation of the profile repository port.
///
/// Requests carry the signed-in user's access token so row-level security
/// applies exactly as it does for the dashboard.
pub struct RestProfileRepository {
    http_client: reqwest::Client,
    rest_url: Url,
    auth: Arc<HostedAuthClient>,
}

impl RestProfileRepository {
    /// Creates a repository for the project at `base_url`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &Url,
        auth: Arc<HostedAuthClient>,
    ) -> AppResult<Self> {
        let rest_url = base_url
            .join("rest/v1/")
            .map_err(|error| AppError::Validation(format!("invalid rest base url: {error}")))?;

        Ok(Self {
            http_client,
            rest_url,
            auth,
        })
    }

    fn profile_url(&self, user_id: UserId) -> AppResult<Url> {
        let mut url = self
            .rest_url
            .join("profiles")
            .map_err(|error| AppError::Internal(format!("invalid profiles endpoint: {error}")))?;
        url.query_pairs_mut()
            .append_pair("id", format!("eq.{user_id}").as_str())
            .append_pair("select", PROFILE_COLUMNS);
        Ok(url)
    }
}

#[async_trait]
impl ProfileRepository for RestProfileRepository {
    async fn find_profile_by_identity(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        let bearer = self
            .auth
            .access_token()
            .await?
            .unwrap_or_else(|| self.auth.api_key().to_owned());

        let response = self
            .http_client
            .get(self.profile_url(user_id)?)
            .header("apikey", self.auth.api_key())
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("profile request failed: {error}")))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "profile request returned {}",
                response.status()
            )));
        }

        let rows = response
            .json::<Vec<Profile>>()
            .await
            .map_err(|error| AppError::Internal(format!("failed to decode profile: {error}")))?;

        Ok(rows.into_iter().next())
    }
}
