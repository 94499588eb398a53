//! Tenantdesk API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tenantdesk_application::{
    FilterOptionsService, IdentityAdmin, LastLoginService, ProfileAdminRepository,
    UserAdminService,
};
use tenantdesk_core::AppError;
use tenantdesk_infrastructure::{
    HostedAuthClient, HostedAuthConfig, InMemorySessionStorage, PostgresAssetFilterRepository,
    PostgresProfileRepository,
};
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;

    // The API never signs in itself; storage stays empty.
    let identity_admin: Arc<dyn IdentityAdmin> = Arc::new(HostedAuthClient::new(
        http_client,
        HostedAuthConfig {
            base_url: config.hosted_base_url.clone(),
            api_key: config.hosted_anon_key.clone(),
            service_role_key: Some(config.hosted_service_role_key.clone()),
        },
        Arc::new(InMemorySessionStorage::new()),
    )?);

    let profile_repository: Arc<dyn ProfileAdminRepository> =
        Arc::new(PostgresProfileRepository::new(pool.clone()));
    let asset_filter_repository = Arc::new(PostgresAssetFilterRepository::new(pool));

    let app_state = AppState {
        last_login_service: LastLoginService::new(profile_repository.clone()),
        user_admin_service: UserAdminService::new(
            profile_repository.clone(),
            identity_admin.clone(),
        ),
        filter_options_service: FilterOptionsService::new(
            profile_repository,
            asset_filter_repository,
        ),
        identity_admin,
    };

    let app = api_router::build_router(app_state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "tenantdesk-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
