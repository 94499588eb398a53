use std::sync::Arc;

use chrono::Utc;
use reqwest::StatusCode;
use tenantdesk_application::{AuthBackend, IdentityAdmin, SessionStorage};
use tenantdesk_core::{AppError, Identity, UserId};
use tenantdesk_domain::{AuthChangeKind, Session};
use url::Url;

use super::{HostedAuthClient, HostedAuthConfig, TokenResponse, map_status};
use crate::{FileSessionStorage, InMemorySessionStorage};

fn client(storage: Arc<dyn SessionStorage>) -> HostedAuthClient {
    let base_url = Url::parse("http://127.0.0.1:9/").unwrap_or_else(|_| panic!("test url"));
    HostedAuthClient::new(
        reqwest::Client::new(),
        HostedAuthConfig {
            base_url,
            api_key: "anon-key".to_owned(),
            service_role_key: None,
        },
        storage,
    )
    .unwrap_or_else(|error| panic!("client: {error}"))
}

fn live_session() -> Session {
    Session {
        access_token: "access".to_owned(),
        refresh_token: "refresh".to_owned(),
        expires_at: Utc::now().timestamp() + 3600,
        user: Identity::new(UserId::new(), Some("tess@example.com".to_owned())),
    }
}

#[test]
fn token_url_targets_auth_v1_with_grant_type() {
    let client = client(Arc::new(InMemorySessionStorage::new()));
    let url = client.token_url("password").map(|url| url.to_string());
    assert_eq!(
        url.ok().as_deref(),
        Some("http://127.0.0.1:9/auth/v1/token?grant_type=password")
    );
}

#[test]
fn token_response_derives_expiry_from_lifetime() {
    let payload = serde_json::json!({
        "access_token": "a",
        "token_type": "bearer",
        "refresh_token": "r",
        "expires_in": 3600,
        "user": {
            "id": "0f3c2f0e-8d8e-4a4e-9d55-3a1c4f5b6e7d",
            "email": "x@example.com",
            "aud": "authenticated"
        }
    });
    let before = Utc::now().timestamp();

    let session = serde_json::from_value::<TokenResponse>(payload)
        .map(TokenResponse::into_session)
        .unwrap_or_else(|error| panic!("decode: {error}"));

    assert!(session.expires_at >= before + 3600);
    assert_eq!(session.user.email(), Some("x@example.com"));
}

#[test]
fn explicit_expiry_wins_over_lifetime() {
    let payload = serde_json::json!({
        "access_token": "a",
        "refresh_token": "r",
        "expires_in": 3600,
        "expires_at": 1_900_000_000_i64,
        "user": { "id": "0f3c2f0e-8d8e-4a4e-9d55-3a1c4f5b6e7d" }
    });

    let session = serde_json::from_value::<TokenResponse>(payload)
        .map(TokenResponse::into_session)
        .unwrap_or_else(|error| panic!("decode: {error}"));

    assert_eq!(session.expires_at, 1_900_000_000);
}

#[test]
fn rejected_credentials_map_to_unauthorized() {
    assert!(matches!(
        map_status(StatusCode::UNAUTHORIZED, "nope".to_owned()),
        AppError::Unauthorized(_)
    ));
    assert!(matches!(
        map_status(StatusCode::BAD_REQUEST, "bad".to_owned()),
        AppError::Validation(_)
    ));
    assert!(matches!(
        map_status(StatusCode::BAD_GATEWAY, "down".to_owned()),
        AppError::Internal(_)
    ));
}

#[tokio::test]
async fn live_stored_session_is_returned_without_refresh() {
    let storage = Arc::new(InMemorySessionStorage::new());
    let session = live_session();
    assert!(storage.store(&session).await.is_ok());
    let client = client(storage);
    let mut changes = client.subscribe();

    let cached = client.cached_session().await;

    assert_eq!(cached.ok().flatten(), Some(session));
    assert!(tokio::time::timeout(std::time::Duration::from_millis(10), changes.next())
        .await
        .is_err());
}

#[tokio::test]
async fn confirm_identity_without_credentials_is_unauthorized() {
    let client = client(Arc::new(InMemorySessionStorage::new()));

    let result = client.confirm_identity().await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn sign_out_without_session_clears_and_notifies() {
    let storage = Arc::new(InMemorySessionStorage::new());
    let client = client(storage.clone());
    let mut changes = client.subscribe();

    assert!(client.sign_out().await.is_ok());

    let change = changes.next().await;
    assert_eq!(change.map(|change| change.kind), Some(AuthChangeKind::SignedOut));
    assert!(matches!(storage.load().await, Ok(None)));
}

#[tokio::test]
async fn identity_delete_requires_service_role_key() {
    let client = client(Arc::new(InMemorySessionStorage::new()));

    let result = client.delete_identity(UserId::new()).await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

async fn corrupt_session_file() -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("tenantdesk-{}.json", uuid::Uuid::new_v4()));
    let written = tokio::fs::write(&path, b"{not json").await;
    assert!(written.is_ok());
    path
}

#[tokio::test]
async fn sign_out_clears_unreadable_session_file() {
    let path = corrupt_session_file().await;
    let client = client(Arc::new(FileSessionStorage::new(&path)));
    let mut changes = client.subscribe();

    assert!(client.sign_out().await.is_ok());

    let change = changes.next().await;
    assert_eq!(change.map(|change| change.kind), Some(AuthChangeKind::SignedOut));
    assert!(!path.exists());
}

#[tokio::test]
async fn unreadable_cached_session_is_discarded() {
    let path = corrupt_session_file().await;
    let client = client(Arc::new(FileSessionStorage::new(&path)));

    let cached = client.cached_session().await;

    assert!(matches!(cached, Ok(None)));
    assert!(!path.exists());
}
