use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tenantdesk_core::AppError;

use crate::Role;

/// Dashboard areas gated by role-based visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Tenant directory and tenant settings.
    Tenants,
    /// User accounts and invitations.
    Users,
    /// Teams and memberships.
    Teams,
    /// Asset inventory.
    Assets,
    /// Policy documents.
    Policies,
    /// Assessment catalogs.
    Assessments,
    /// Platform-wide settings.
    PlatformSettings,
}

impl Surface {
    /// Returns a stable transport value for this surface.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenants => "tenants",
            Self::Users => "users",
            Self::Teams => "teams",
            Self::Assets => "assets",
            Self::Policies => "policies",
            Self::Assessments => "assessments",
            Self::PlatformSettings => "platform_settings",
        }
    }

    /// Returns all known surfaces.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Surface] = &[
            Surface::Tenants,
            Surface::Users,
            Surface::Teams,
            Surface::Assets,
            Surface::Policies,
            Surface::Assessments,
            Surface::PlatformSettings,
        ];

        ALL
    }

    /// Returns whether `role` may see this surface.
    #[must_use]
    pub fn is_visible_to(&self, role: Role) -> bool {
        match self {
            Self::Tenants | Self::PlatformSettings => role == Role::Superadmin,
            Self::Users | Self::Teams => role != Role::TenantUser,
            Self::Assets | Self::Policies | Self::Assessments => true,
        }
    }

    /// Returns the surfaces visible to `role`, in navigation order.
    #[must_use]
    pub fn visible_to(role: Role) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|surface| surface.is_visible_to(role))
            .collect()
    }
}

impl FromStr for Surface {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|surface| surface.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown surface '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::Surface;
    use crate::Role;

    #[test]
    fn tenant_user_sees_only_content_surfaces() {
        assert_eq!(
            Surface::visible_to(Role::TenantUser),
            vec![Surface::Assets, Surface::Policies, Surface::Assessments]
        );
    }

    #[test]
    fn tenant_admin_manages_users_but_not_tenants() {
        assert!(Surface::Users.is_visible_to(Role::TenantAdmin));
        assert!(!Surface::Tenants.is_visible_to(Role::TenantAdmin));
    }

    #[test]
    fn superadmin_sees_everything() {
        assert_eq!(Surface::visible_to(Role::Superadmin).len(), Surface::all().len());
    }

    #[test]
    fn unknown_surface_is_rejected() {
        assert!("billing".parse::<Surface>().is_err());
    }
}
