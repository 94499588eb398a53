use axum::Json;
use axum::extract::{Extension, Path, State};
use tenantdesk_core::{Identity, TenantId};

use crate::dto::AssetFilterOptionsResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn asset_filter_options_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<AssetFilterOptionsResponse>> {
    let tenant_id = TenantId::parse(tenant_id.as_str())?;
    let options = state
        .filter_options_service
        .asset_filter_options(&identity, tenant_id)
        .await?;

    Ok(Json(AssetFilterOptionsResponse::from(options)))
}
