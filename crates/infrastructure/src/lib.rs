//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod hosted_auth_client;
mod http_last_login_notifier;
mod postgres_asset_filter_repository;
mod postgres_profile_repository;
mod rest_profile_repository;
mod session_storage;

pub use hosted_auth_client::{HostedAuthClient, HostedAuthConfig};
pub use http_last_login_notifier::HttpLastLoginNotifier;
pub use postgres_asset_filter_repository::PostgresAssetFilterRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
pub use rest_profile_repository::RestProfileRepository;
pub use session_storage::{FileSessionStorage, InMemorySessionStorage};
