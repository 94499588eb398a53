//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod asset;
mod profile;
mod security;
mod session;
mod user;

pub use asset::AssetFilterField;
pub use profile::{Profile, Role, TenantScope};
pub use security::Surface;
pub use session::{AuthChange, AuthChangeKind, SESSION_EXPIRY_SKEW_SECONDS, Session};
pub use user::EmailAddress;
