//! Module payload endpoints.
//!
//! A module is an opaque per-device blob; the store key composes the
//! authenticated account, the device and the module name, so a device can
//! only ever touch its own payloads.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;

use crate::auth::middleware::AuthContext;
use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::state::AppState;
use crate::store::{module_key, module_key_pattern};

/// Fetch a module payload. Absent modules are an empty 204, not an error,
/// so a fresh device can poll before its first write.
pub async fn get_module(
    State(state): State<AppState>,
    Path(name): Path<String>,
    context: Option<Extension<AuthContext>>,
) -> ApiResult<Response> {
    let context = require_context(context)?;
    let key = module_key(&context.account.username, context.device.id, &name);

    match state.modules.get(&key).await? {
        Some(data) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            data,
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Create or replace a module payload.
pub async fn set_module(
    State(state): State<AppState>,
    Path(name): Path<String>,
    context: Option<Extension<AuthContext>>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let context = require_context(context)?;
    let key = module_key(&context.account.username, context.device.id, &name);

    state.modules.set(&key, body.to_vec()).await?;

    Ok(StatusCode::ACCEPTED)
}

/// Drop every module payload of the calling device.
pub async fn delete_modules(
    State(state): State<AppState>,
    context: Option<Extension<AuthContext>>,
) -> ApiResult<StatusCode> {
    let context = require_context(context)?;
    let pattern = module_key_pattern(&context.account.username, context.device.id);

    state.modules.delete_by_pattern(&pattern).await?;

    Ok(StatusCode::ACCEPTED)
}

fn require_context(context: Option<Extension<AuthContext>>) -> ApiResult<AuthContext> {
    context
        .map(|Extension(context)| context)
        .ok_or_else(|| ApiError::forbidden(AuthFailure::NoAccountInContext))
}
