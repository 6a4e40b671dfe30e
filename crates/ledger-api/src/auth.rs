//! The HMAC "wrapping decorator" every endpoint sits behind (spec.md §4.8):
//! resolve the calling `CurrencyService` from its header, check it's
//! enabled, then (unless the process disables HMAC entirely) verify the
//! request's signature before handing it to the route.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use ledger_core::LedgerError;

use crate::error::ApiError;
use crate::state::AppState;

/// The service resolved by [`hmac_auth`], made available to handlers via
/// `Extension<AuthContext>`.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub service_name: String,
}

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn hmac_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers().clone();
    let path = request.uri().path().to_string();

    let service_name = headers
        .get(&state.hmac_config.service_header)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| LedgerError::auth("Service header not found"))?
        .to_string();

    let service = state
        .store
        .get_service(&service_name)?
        .ok_or_else(|| LedgerError::auth("Service not found"))?;
    if !service.enabled {
        return Err(LedgerError::auth("Service disabled").into());
    }

    if state.hmac_config.enable_hmac_validation {
        let service_auth = state
            .store
            .get_service_auth(&service_name)?
            .ok_or_else(|| LedgerError::auth("Service has no authentication configured"))?;

        let (parts, body) = request.into_parts();
        let body_bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| LedgerError::auth("request body could not be read"))?;

        let timestamp_header = headers
            .get(&state.hmac_config.timestamp_header)
            .and_then(|v| v.to_str().ok());
        let signature_header = headers
            .get(&state.hmac_config.signature_header)
            .and_then(|v| v.to_str().ok());

        ledger_auth::validate_request(
            &state.hmac_config,
            &service_auth.key,
            service_auth.is_battlemetrics,
            &path,
            &body_bytes,
            timestamp_header,
            signature_header,
        )?;

        request = Request::from_parts(parts, Body::from(body_bytes));
    }

    request.extensions_mut().insert(AuthContext { service_name });
    Ok(next.run(request).await)
}
