//! Tenantdesk console: runs the session tracker against the hosted auth service.

#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tenantdesk_application::{AuthPhase, AuthSnapshot, SessionTracker, TrackerTimeouts};
use tenantdesk_core::{AppError, AppResult};
use tenantdesk_domain::Surface;
use tenantdesk_infrastructure::{
    FileSessionStorage, HostedAuthClient, HostedAuthConfig, HttpLastLoginNotifier,
    RestProfileRepository,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone)]
struct ConsoleConfig {
    hosted_base_url: Url,
    hosted_anon_key: String,
    api_base_url: Url,
    session_file: PathBuf,
    credentials: Option<(String, String)>,
    http_timeout: Duration,
}

impl ConsoleConfig {
    fn load() -> AppResult<Self> {
        let hosted_base_url =
            parse_url("HOSTED_BASE_URL", required_non_empty_env("HOSTED_BASE_URL")?)?;
        let hosted_anon_key = required_non_empty_env("HOSTED_ANON_KEY")?;
        let api_base_url = parse_url(
            "API_BASE_URL",
            env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3001/".to_owned()),
        )?;
        let session_file = env::var("SESSION_FILE")
            .map_or_else(|_| PathBuf::from(".tenantdesk/session.json"), PathBuf::from);
        let credentials = match (optional_env("CONSOLE_EMAIL"), optional_env("CONSOLE_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "CONSOLE_EMAIL and CONSOLE_PASSWORD must be set together".to_owned(),
                ));
            }
        };
        let http_timeout = env::var("HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(Duration::from_secs(10), Duration::from_secs);

        Ok(Self {
            hosted_base_url,
            hosted_anon_key,
            api_base_url,
            session_file,
            credentials,
            http_timeout,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let auth = Arc::new(HostedAuthClient::new(
        http_client.clone(),
        HostedAuthConfig {
            base_url: config.hosted_base_url.clone(),
            api_key: config.hosted_anon_key.clone(),
            service_role_key: None,
        },
        Arc::new(FileSessionStorage::new(config.session_file.clone())),
    )?);
    let profiles = Arc::new(RestProfileRepository::new(
        http_client.clone(),
        &config.hosted_base_url,
        auth.clone(),
    )?);
    let last_login = Arc::new(HttpLastLoginNotifier::new(
        http_client,
        &config.api_base_url,
        auth.clone(),
    )?);

    let tracker = SessionTracker::mount(
        auth.clone(),
        profiles,
        last_login,
        TrackerTimeouts::default(),
    );
    let mut snapshots = tracker.subscribe();

    info!(session_file = %config.session_file.display(), "tenantdesk-console started");

    let settled = tracker.initialized().await;
    log_snapshot(&settled);

    if settled.identity.is_none()
        && let Some((email, password)) = config.credentials.as_ref()
        && let Err(error) = auth.sign_in_with_password(email, password).await
    {
        warn!(error = %error, "sign-in failed");
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                log_snapshot(&snapshot);
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    warn!(error = %error, "failed to listen for shutdown signal");
                }
                break;
            }
        }
    }

    tracker.unmount();
    info!("tenantdesk-console stopped");
    Ok(())
}

fn log_snapshot(snapshot: &AuthSnapshot) {
    match snapshot.phase() {
        AuthPhase::Uninitialized | AuthPhase::Loading => info!("auth state loading"),
        AuthPhase::Anonymous => info!("signed out"),
        AuthPhase::Authenticated => {
            let user_id = snapshot
                .identity
                .as_ref()
                .map(|identity| identity.id().to_string())
                .unwrap_or_default();

            match snapshot.profile.as_ref() {
                Some(profile) => {
                    let surfaces = Surface::visible_to(profile.role)
                        .iter()
                        .map(Surface::as_str)
                        .collect::<Vec<_>>()
                        .join(",");
                    if let Err(error) = profile.validate_tenant_assignment() {
                        warn!(user_id = %user_id, error = %error, "profile is misconfigured");
                    }
                    info!(
                        user_id = %user_id,
                        role = profile.role.as_str(),
                        surfaces = %surfaces,
                        "signed in"
                    );
                }
                None => info!(user_id = %user_id, "signed in, profile pending"),
            }
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_url(name: &str, value: String) -> AppResult<Url> {
    Url::parse(value.as_str())
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn required_non_empty_env(name: &str) -> AppResult<String> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
