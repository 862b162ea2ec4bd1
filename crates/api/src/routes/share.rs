//! Share-code issuance

use axum::{Extension, Json};
use axum::extract::State;
use serde::Serialize;
use syncd_shared::ShareCode;

use crate::auth::middleware::AuthContext;
use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_code: ShareCode,
}

/// Mint a one-time share code for the authenticated account.
/// The middleware ordering guarantees a context; the check stays anyway so a
/// future routing mistake fails closed instead of panicking.
pub async fn share(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
) -> ApiResult<Json<ShareResponse>> {
    let Extension(context) =
        context.ok_or_else(|| ApiError::forbidden(AuthFailure::NoAccountInContext))?;

    let share_code = state.sharing.share(&context.account).await?;

    tracing::info!(username = %context.account.username, "issued share code");

    Ok(Json(ShareResponse { share_code }))
}
