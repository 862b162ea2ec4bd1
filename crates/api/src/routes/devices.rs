//! Device listing

use axum::{Extension, Json};
use axum::extract::State;
use serde::Serialize;
use syncd_shared::DeviceId;

use crate::auth::middleware::AuthContext;
use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeviceListItem {
    pub id: DeviceId,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    pub count: usize,
    pub items: Vec<DeviceListItem>,
}

/// List all devices bound to the authenticated account.
pub async fn list_devices(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
) -> ApiResult<Json<DeviceListResponse>> {
    // Devices cannot be enumerated without an account
    let Extension(context) =
        context.ok_or_else(|| ApiError::forbidden(AuthFailure::NoAccountInContext))?;

    let devices = state.devices.get_devices(&context.account).await?;
    let items: Vec<DeviceListItem> = devices
        .into_keys()
        .map(|id| DeviceListItem { id })
        .collect();

    Ok(Json(DeviceListResponse {
        count: items.len(),
        items,
    }))
}
