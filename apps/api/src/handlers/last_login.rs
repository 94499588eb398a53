use axum::Json;
use axum::extract::{Extension, State};
use tenantdesk_core::{Identity, UserId};

use crate::dto::{LastLoginResponse, UpdateLastLoginRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn update_last_login_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateLastLoginRequest>,
) -> ApiResult<Json<LastLoginResponse>> {
    let user_id = UserId::parse(payload.user_id.as_str())?;
    let last_login = state
        .last_login_service
        .record_sign_in(&identity, user_id)
        .await?;

    Ok(Json(LastLoginResponse {
        last_login: last_login.to_rfc3339(),
    }))
}
