//! Application services and ports.

#![forbid(unsafe_code)]

mod admin_ports;
mod auth_ports;
mod filter_options_service;
mod last_login_service;
mod session_tracker;
mod settle;
mod user_admin_service;

pub use admin_ports::{
    AssetFilterRepository, CascadeDeleteSummary, IdentityAdmin, ProfileAdminRepository,
};
pub use auth_ports::{
    AuthBackend, AuthSubscription, LastLoginNotifier, ProfileRepository, SessionStorage,
};
pub use filter_options_service::{AssetFilterOptions, FilterOptionsService};
pub use last_login_service::LastLoginService;
pub use session_tracker::{AuthPhase, AuthSnapshot, SessionTracker, TrackerTimeouts};
pub use settle::{Settled, settle};
pub use user_admin_service::UserAdminService;
