//! First-contact registration.
//!
//! One endpoint covers three flows: anonymous signup (server generates
//! username and secret), signup with caller-chosen credentials, and binding
//! an additional device to an existing account through a share code.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use syncd_shared::{Account, DeviceId, ShareCode};

use crate::auth::basic::Credentials;
use crate::auth::generate::{generate_secret, generate_username};
use crate::auth::middleware::DEVICE_ID_HEADER;
use crate::auth::secret::verify_secret;
use crate::error::{ApiError, ApiResult, AuthFailure};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterParams {
    pub share: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub username: String,
    pub device_id: DeviceId,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Query(params): Query<RegisterParams>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let credentials = Credentials::from_headers(&headers).map_err(|_| {
        ApiError::BadRequest("invalid basic auth header cannot be used for registration".into())
    })?;

    // Unlike the middleware, a missing device header is fine here: pure
    // anonymous registration gets a generated id echoed back
    let device_id = match headers.get(DEVICE_ID_HEADER) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| DeviceId::parse(v).ok())
            .ok_or_else(|| {
                ApiError::BadRequest(format!("{DEVICE_ID_HEADER} has to be a valid UUID"))
            })?,
        None => DeviceId::new(),
    };

    let share_code = params
        .share
        .filter(|code| !code.is_empty())
        .map(ShareCode::from);
    let supplied_username = credentials.as_ref().map(|c| c.username.clone());
    let supplied_secret = credentials.map(|c| c.secret);

    // A share code pins the account; it must agree with any Basic username
    let account = match &share_code {
        Some(code) => {
            let issuer = state
                .sharing
                .shared(code)
                .await?
                .ok_or_else(|| ApiError::forbidden(AuthFailure::ShareCodeInvalid))?;

            if let Some(username) = &supplied_username {
                if issuer.username != *username {
                    return Err(ApiError::forbidden(AuthFailure::ShareCodeMismatch));
                }
            }

            Some(issuer)
        }
        None => match &supplied_username {
            Some(username) => state.accounts.find(username).await?,
            None => None,
        },
    };

    let username = account
        .as_ref()
        .map(|a| a.username.clone())
        .or(supplied_username)
        .unwrap_or_else(generate_username);
    let secret =
        supplied_secret.unwrap_or_else(|| generate_secret(&state.config.secret_policy));

    let account = match account {
        // First contact for this username: the caller owns the fresh account,
        // so its device binds unconditionally
        None => state.accounts.create(&username).await?,
        Some(account) => {
            verify_existing_device(&state, &account, device_id, &secret, &share_code).await?;
            account
        }
    };

    // Re-adding an already-bound device is the idempotent retry path; with a
    // share code it is the rebind path. Either way the digest is overwritten.
    let device = state.devices.add_device(&account, device_id, &secret).await?;

    if let Some(code) = &share_code {
        // Revoke only after a successful bind; a failed bind must not burn
        // the code. If revocation itself fails the client retries the whole
        // flow, which re-runs the idempotent bind.
        state
            .sharing
            .revoke(code)
            .await
            .map_err(|err| ApiError::Internal(format!("cannot revoke share code: {err}")))?;
    }

    tracing::info!(username = %account.username, device_id = %device.id, "device registered");

    let mut response = (
        StatusCode::OK,
        Json(RegistrationResult {
            username: account.username,
            device_id: device.id,
            password: secret,
        }),
    )
        .into_response();

    // Callers that omitted the device id discover the generated one here
    if let Ok(header_value) = HeaderValue::from_str(&device.id.to_string()) {
        response.headers_mut().insert(DEVICE_ID_HEADER, header_value);
    }

    Ok(response)
}

/// Gate (re-)binding against a pre-existing account: an already-bound device
/// must prove the old secret, an unbound device needs a share code.
async fn verify_existing_device(
    state: &AppState,
    account: &Account,
    device_id: DeviceId,
    secret: &str,
    share_code: &Option<ShareCode>,
) -> ApiResult<()> {
    match state.devices.get_device(account, device_id).await? {
        Some(device) => {
            // Share-code holders already proved ownership; Basic-only callers
            // must present the currently bound secret
            if share_code.is_none() && !verify_secret(&device.hashed_secret, secret) {
                return Err(ApiError::forbidden(AuthFailure::SecretMismatch));
            }

            Ok(())
        }
        None if share_code.is_some() => Ok(()),
        None => Err(ApiError::forbidden(AuthFailure::DeviceNotRegistered)),
    }
}
