use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tenantdesk_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_bearer_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let access_token = bearer_token(
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
    )
    .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?
    .to_owned();

    let identity = state
        .identity_admin
        .verify_access_token(access_token.as_str())
        .await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn bearer_token(header_value: Option<&str>) -> Option<&str> {
    let (scheme, token) = header_value?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
