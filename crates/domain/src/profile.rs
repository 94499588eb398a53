//! Application-level user profiles and role rules.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantdesk_core::{AppError, AppResult, TenantId, UserId};

/// Dashboard role assigned to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator with access to every tenant.
    Superadmin,
    /// Administrator of a single tenant.
    TenantAdmin,
    /// Regular member of a single tenant.
    TenantUser,
}

impl Role {
    /// Returns the storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::TenantAdmin => "tenant_admin",
            Self::TenantUser => "tenant_user",
        }
    }

    /// Returns whether profiles with this role must reference a tenant.
    #[must_use]
    pub fn requires_tenant(&self) -> bool {
        !matches!(self, Self::Superadmin)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "superadmin" => Ok(Self::Superadmin),
            "tenant_admin" => Ok(Self::TenantAdmin),
            "tenant_user" => Ok(Self::TenantUser),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

/// Application user record keyed by the authenticated identity.
///
/// Profiles are surfaced exactly as stored. Readers must not repair a
/// profile that violates the role/tenant rule; only admin writes go through
/// [`Profile::validate_tenant_assignment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same value as the identity subject.
    pub id: UserId,
    /// Display name shown in the dashboard.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Contact email copied from the identity at invite time.
    #[serde(default)]
    pub email: Option<String>,
    /// Dashboard role.
    pub role: Role,
    /// Owning tenant, optional only for superadmins.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// Job title.
    #[serde(default)]
    pub title: Option<String>,
    /// Last successful sign-in.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl Profile {
    /// Checks the role/tenant invariant before a profile write.
    pub fn validate_tenant_assignment(&self) -> AppResult<()> {
        if self.role.requires_tenant() && self.tenant_id.is_none() {
            return Err(AppError::Validation(format!(
                "role '{}' requires a tenant",
                self.role.as_str()
            )));
        }

        Ok(())
    }

    /// Returns whether this profile may administer records of `tenant_id`.
    #[must_use]
    pub fn administers(&self, tenant_id: TenantId) -> bool {
        match self.role {
            Role::Superadmin => true,
            Role::TenantAdmin => self.tenant_id == Some(tenant_id),
            Role::TenantUser => false,
        }
    }

    /// Resolves the tenant scope for queries issued on behalf of this profile.
    ///
    /// `selected_tenant` is the "current tenant" picked in the dashboard and is
    /// only honored for superadmins.
    #[must_use]
    pub fn tenant_scope(&self, selected_tenant: Option<TenantId>) -> TenantScope {
        match self.role {
            Role::Superadmin => {
                selected_tenant.map_or(TenantScope::AllTenants, TenantScope::Tenant)
            }
            Role::TenantAdmin | Role::TenantUser => self
                .tenant_id
                .map_or(TenantScope::Unassigned, TenantScope::Tenant),
        }
    }
}

/// Tenant partition a caller may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Superadmin without a selected tenant.
    AllTenants,
    /// A single tenant.
    Tenant(TenantId),
    /// Tenant-bound profile missing its tenant reference. Sees nothing.
    Unassigned,
}

impl TenantScope {
    /// Returns whether records of `tenant_id` are visible in this scope.
    #[must_use]
    pub fn includes(&self, tenant_id: TenantId) -> bool {
        match self {
            Self::AllTenants => true,
            Self::Tenant(scoped) => *scoped == tenant_id,
            Self::Unassigned => false,
        }
    }
}
