use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use tenantdesk_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/update-last-login",
            post(handlers::last_login::update_last_login_handler),
        )
        .route(
            "/api/users/{user_id}",
            delete(handlers::users::delete_user_handler),
        )
        .route(
            "/api/tenants/{tenant_id}/assets/filter-options",
            get(handlers::assets::asset_filter_options_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_bearer_identity,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
