//! Ports used by the server-side admin routes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tenantdesk_core::{AppResult, Identity, TenantId, UserId};
use tenantdesk_domain::{AssetFilterField, Profile};

/// Rows removed or detached by a cascading user delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeDeleteSummary {
    /// Team membership rows deleted.
    pub team_memberships: u64,
    /// Assets whose owner reference was cleared.
    pub assets_unassigned: u64,
    /// Profile rows deleted (0 or 1).
    pub profiles: u64,
}

/// Repository port for profile administration.
#[async_trait]
pub trait ProfileAdminRepository: Send + Sync {
    /// Finds a profile by its identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<Profile>>;

    /// Stores `at` as the last sign-in time. Returns `false` when no profile exists.
    async fn touch_last_login(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<bool>;

    /// Deletes the profile and every row that references it.
    async fn delete_user_cascade(&self, user_id: UserId) -> AppResult<CascadeDeleteSummary>;
}

/// Repository port for asset inventory filter values.
#[async_trait]
pub trait AssetFilterRepository: Send + Sync {
    /// Returns the distinct raw values of `field` among the tenant's assets.
    async fn distinct_values(
        &self,
        tenant_id: TenantId,
        field: AssetFilterField,
    ) -> AppResult<Vec<String>>;
}

/// Privileged access to the hosted auth service.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Resolves the identity behind a bearer access token.
    async fn verify_access_token(&self, access_token: &str) -> AppResult<Identity>;

    /// Removes the identity from the auth service.
    async fn delete_identity(&self, user_id: UserId) -> AppResult<()>;
}
