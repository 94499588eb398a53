use axum::Json;
use axum::extract::{Extension, Path, State};
use tenantdesk_core::{Identity, UserId};

use crate::dto::DeleteUserResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<DeleteUserResponse>> {
    let user_id = UserId::parse(user_id.as_str())?;
    let summary = state
        .user_admin_service
        .delete_user(&identity, user_id)
        .await?;

    Ok(Json(DeleteUserResponse::from(summary)))
}
