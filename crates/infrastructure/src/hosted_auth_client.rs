//! Client for the hosted auth service's REST interface.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use tenantdesk_application::{AuthBackend, AuthSubscription, IdentityAdmin, SessionStorage};
use tenantdesk_core::{AppError, AppResult, Identity, UserId};
use tenantdesk_domain::{AuthChange, AuthChangeKind, EmailAddress, Session};

#[cfg(test)]
mod tests;

const AUTH_CHANGE_CAPACITY: usize = 32;

/// Connection settings for the hosted auth service.
#[derive(Debug, Clone)]
pub struct HostedAuthConfig {
    /// Project base URL, e.g. `https://project.example.co/`.
    pub base_url: Url,
    /// Public (anonymous) API key sent with every request.
    pub api_key: String,
    /// Privileged key for admin endpoints. Only set on the server.
    pub service_role_key: Option<String>,
}

/// Hosted auth client holding the signed-in session.
///
/// Every session change is persisted through the configured storage and
/// broadcast to subscribers.
pub struct HostedAuthClient {
    http_client: reqwest::Client,
    auth_url: Url,
    api_key: String,
    service_role_key: Option<String>,
    storage: Arc<dyn SessionStorage>,
    changes: broadcast::Sender<AuthChange>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let issued_at = Utc::now().timestamp();
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|seconds| issued_at.saturating_add(seconds)))
            .unwrap_or(issued_at);

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
}

impl HostedAuthClient {
    /// Creates a client for the configured project.
    pub fn new(
        http_client: reqwest::Client,
        config: HostedAuthConfig,
        storage: Arc<dyn SessionStorage>,
    ) -> AppResult<Self> {
        let auth_url = config
            .base_url
            .join("auth/v1/")
            .map_err(|error| AppError::Validation(format!("invalid auth base url: {error}")))?;
        let (changes, _) = broadcast::channel(AUTH_CHANGE_CAPACITY);

        Ok(Self {
            http_client,
            auth_url,
            api_key: config.api_key,
            service_role_key: config.service_role_key,
            storage,
            changes,
        })
    }

    /// Signs in with email and password and stores the new session.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Session> {
        let email = EmailAddress::new(email)?;
        let response = self
            .http_client
            .post(self.token_url("password")?)
            .header("apikey", self.api_key.as_str())
            .json(&serde_json::json!({
                "email": email.as_str(),
                "password": password,
            }))
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("sign-in request failed: {error}")))?;

        let session = decode_token_response(response, "sign-in").await?;
        self.storage.store(&session).await?;
        info!(user_id = %session.user.id(), "signed in");
        self.emit(AuthChangeKind::SignedIn, Some(session.clone()));

        Ok(session)
    }

    /// Exchanges a refresh token for a new session and stores it.
    pub async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session> {
        let response = self
            .http_client
            .post(self.token_url("refresh_token")?)
            .header("apikey", self.api_key.as_str())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("refresh request failed: {error}")))?;

        let session = decode_token_response(response, "token refresh").await?;
        self.storage.store(&session).await?;
        debug!(user_id = %session.user.id(), "session refreshed");
        self.emit(AuthChangeKind::TokenRefreshed, Some(session.clone()));

        Ok(session)
    }

    /// Revokes the stored session and forgets it locally.
    ///
    /// The local session is cleared even when the revoke call fails.
    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(session) = self.stored_session().await {
            let revoked = self
                .http_client
                .post(self.endpoint("logout")?)
                .header("apikey", self.api_key.as_str())
                .bearer_auth(session.access_token.as_str())
                .send()
                .await;

            match revoked {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => warn!(status = %response.status(), "session revoke rejected"),
                Err(error) => warn!(error = %error, "session revoke request failed"),
            }
        }

        self.storage.clear().await?;
        info!("signed out");
        self.emit(AuthChangeKind::SignedOut, None);
        Ok(())
    }

    /// Loads the stored session, treating an unreadable one as absent.
    async fn stored_session(&self) -> Option<Session> {
        match self.storage.load().await {
            Ok(session) => session,
            Err(error) => {
                warn!(error = %error, "stored session is unreadable");
                None
            }
        }
    }

    /// Returns the access token of the stored session, if any.
    pub async fn access_token(&self) -> AppResult<Option<String>> {
        Ok(self
            .storage
            .load()
            .await?
            .map(|session| session.access_token))
    }

    /// Returns the public API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        self.api_key.as_str()
    }

    async fn fetch_user(&self, access_token: &str) -> AppResult<Identity> {
        let response = self
            .http_client
            .get(self.endpoint("user")?)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("identity request failed: {error}")))?;

        if !response.status().is_success() {
            return Err(status_error(response, "identity confirmation").await);
        }

        response
            .json::<Identity>()
            .await
            .map_err(|error| AppError::Internal(format!("failed to decode identity: {error}")))
    }

    fn emit(&self, kind: AuthChangeKind, session: Option<Session>) {
        if self.changes.send(AuthChange::new(kind, session)).is_err() {
            debug!(kind = ?kind, "no auth change listeners");
        }
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.auth_url
            .join(path)
            .map_err(|error| AppError::Internal(format!("invalid auth endpoint '{path}': {error}")))
    }

    fn token_url(&self, grant_type: &str) -> AppResult<Url> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }
}

#[async_trait]
impl AuthBackend for HostedAuthClient {
    async fn cached_session(&self) -> AppResult<Option<Session>> {
        let session = match self.storage.load().await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(None),
            Err(error) => {
                warn!(error = %error, "discarding unreadable stored session");
                self.storage.clear().await?;
                return Ok(None);
            }
        };

        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }

        match self.refresh_session(session.refresh_token.as_str()).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                warn!(error = %error, "stored session expired and could not be refreshed");
                self.storage.clear().await?;
                self.emit(AuthChangeKind::SignedOut, None);
                Ok(None)
            }
        }
    }

    async fn confirm_identity(&self) -> AppResult<Identity> {
        let access_token = self
            .access_token()
            .await?
            .ok_or_else(|| AppError::Unauthorized("no stored credentials".to_owned()))?;

        self.fetch_user(access_token.as_str()).await
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.changes.subscribe())
    }
}

#[async_trait]
impl IdentityAdmin for HostedAuthClient {
    async fn verify_access_token(&self, access_token: &str) -> AppResult<Identity> {
        self.fetch_user(access_token).await
    }

    async fn delete_identity(&self, user_id: UserId) -> AppResult<()> {
        let service_role_key = self.service_role_key.as_deref().ok_or_else(|| {
            AppError::Internal("service role key is required to delete identities".to_owned())
        })?;

        let response = self
            .http_client
            .delete(self.endpoint(&format!("admin/users/{user_id}"))?)
            .header("apikey", service_role_key)
            .bearer_auth(service_role_key)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("identity delete request failed: {error}"))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(user_id = %user_id, "identity already absent");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(status_error(response, "identity delete").await);
        }

        Ok(())
    }
}

async fn decode_token_response(response: reqwest::Response, operation: &str) -> AppResult<Session> {
    if !response.status().is_success() {
        return Err(status_error(response, operation).await);
    }

    response
        .json::<TokenResponse>()
        .await
        .map(TokenResponse::into_session)
        .map_err(|error| {
            AppError::Internal(format!("failed to decode {operation} response: {error}"))
        })
}

async fn status_error(response: reqwest::Response, operation: &str) -> AppError {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| status.to_string());

    map_status(status, format!("{operation} failed: {message}"))
}

fn map_status(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        _ => AppError::Internal(message),
    }
}
