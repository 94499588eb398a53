use std::sync::Arc;

use tenantdesk_application::{
    FilterOptionsService, IdentityAdmin, LastLoginService, UserAdminService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub last_login_service: LastLoginService,
    pub user_admin_service: UserAdminService,
    pub filter_options_service: FilterOptionsService,
    pub identity_admin: Arc<dyn IdentityAdmin>,
}
