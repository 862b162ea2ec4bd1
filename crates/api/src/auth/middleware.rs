//! Device authorization middleware.
//!
//! Every protected request passes through here. The outcome is either an
//! error response from the 401/403/400 family or a typed [`AuthContext`]
//! in the request extensions for downstream handlers.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use syncd_shared::{Account, Device, DeviceId, ShareCode};

use crate::auth::basic::Credentials;
use crate::auth::secret::verify_secret;
use crate::error::{ApiError, AuthFailure};
use crate::state::AppState;

/// Header carrying the device identity.
pub const DEVICE_ID_HEADER: &str = "X-Device-ID";

/// Query parameter carrying a share code.
pub const SHARE_QUERY_PARAM: &str = "share";

/// The verified (account, device) pair for an authorized request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
    pub device: Device,
}

/// Axum middleware implementing the device authorization protocol.
///
/// A device never seen before may still authorize by presenting a share
/// code issued by its account; binding then happens atomically with the
/// authorization decision so a code is never consumed without the device
/// actually being added. The code itself stays valid — revocation is the
/// registration handler's job once the flow fully completes.
pub async fn require_device_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let share = share_code_from_query(request.uri().query());

    match authorize(&state, request.headers(), share).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    share: Option<ShareCode>,
) -> Result<AuthContext, ApiError> {
    let credentials = Credentials::from_headers(headers)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
        .ok_or(ApiError::Unauthorized)?;

    // Unknown account and missing credentials are indistinguishable on the
    // wire, so a 401 here leaks no account existence
    let account = state
        .accounts
        .find(&credentials.username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let device_id = device_id_from_headers(headers)?;

    match state.devices.get_device(&account, device_id).await? {
        Some(device) => {
            if !verify_secret(&device.hashed_secret, &credentials.secret) {
                return Err(ApiError::forbidden(AuthFailure::SecretMismatch));
            }

            Ok(AuthContext { account, device })
        }
        None => {
            bind_via_share_code(state, account, device_id, &credentials.secret, share).await
        }
    }
}

/// The "new device" branch: only a valid share code issued by this very
/// account may bind a device that has never been seen.
async fn bind_via_share_code(
    state: &AppState,
    account: Account,
    device_id: DeviceId,
    secret: &str,
    share: Option<ShareCode>,
) -> Result<AuthContext, ApiError> {
    let share = share.ok_or_else(|| ApiError::forbidden(AuthFailure::DeviceNotRegistered))?;

    let issuer = state
        .sharing
        .shared(&share)
        .await?
        .ok_or_else(|| ApiError::forbidden(AuthFailure::ShareCodeInvalid))?;

    if issuer.username != account.username {
        return Err(ApiError::forbidden(AuthFailure::ShareCodeMismatch));
    }

    let device = state.devices.add_device(&account, device_id, secret).await?;

    tracing::info!(
        username = %account.username,
        device_id = %device_id,
        "bound new device via share code"
    );

    Ok(AuthContext { account, device })
}

pub(crate) fn device_id_from_headers(headers: &HeaderMap) -> Result<DeviceId, ApiError> {
    let value = headers
        .get(DEVICE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "this endpoint has to be called with the {DEVICE_ID_HEADER} header"
            ))
        })?;

    DeviceId::parse(value)
        .map_err(|_| ApiError::BadRequest(format!("{DEVICE_ID_HEADER} has to be a valid UUID")))
}

/// Pull the share code out of a raw query string. Codes are UUID-derived,
/// so no percent-decoding is needed.
pub(crate) fn share_code_from_query(query: Option<&str>) -> Option<ShareCode> {
    query?
        .split('&')
        .find_map(|pair| {
            pair.strip_prefix(SHARE_QUERY_PARAM)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|code| !code.is_empty())
        .map(|code| ShareCode(code.to_string()))
}
