use serde::{Deserialize, Serialize};
use tenantdesk_application::{AssetFilterOptions, CascadeDeleteSummary};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Incoming payload for the last-login route.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-last-login-request.ts"
)]
pub struct UpdateLastLoginRequest {
    pub user_id: String,
}

/// Response of the last-login route.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/last-login-response.ts"
)]
pub struct LastLoginResponse {
    pub last_login: String,
}

/// Rows touched by a cascading user delete.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/delete-user-response.ts"
)]
pub struct DeleteUserResponse {
    pub team_memberships: u64,
    pub assets_unassigned: u64,
    pub profiles: u64,
}

impl From<CascadeDeleteSummary> for DeleteUserResponse {
    fn from(value: CascadeDeleteSummary) -> Self {
        Self {
            team_memberships: value.team_memberships,
            assets_unassigned: value.assets_unassigned,
            profiles: value.profiles,
        }
    }
}

/// Dropdown options for the asset inventory filters.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/asset-filter-options-response.ts"
)]
pub struct AssetFilterOptionsResponse {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    pub statuses: Vec<String>,
}

impl From<AssetFilterOptions> for AssetFilterOptionsResponse {
    fn from(value: AssetFilterOptions) -> Self {
        Self {
            categories: value.categories,
            locations: value.locations,
            statuses: value.statuses,
        }
    }
}
