use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use ledger_core::{Holder, LedgerError};
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::pagination::{paginate, Page, PageParams};
use crate::permissions::ServicePermissions;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ListHoldersQuery {
    pub holder_type: Option<String>,
    pub holder_id: Option<String>,
    pub created_at_after: Option<DateTime<Utc>>,
    pub created_at_before: Option<DateTime<Utc>>,
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub page: PageParams,
}

pub async fn list_holders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListHoldersQuery>,
) -> Result<Json<Page<Holder>>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("holders")?;

    let results = state
        .store
        .iter_holders()?
        .into_iter()
        .filter(|h| query.holder_type.as_deref().map_or(true, |t| h.holder_type == t))
        .filter(|h| query.holder_id.as_deref().map_or(true, |id| h.holder_id == id))
        .filter(|h| query.enabled.map_or(true, |e| h.enabled == e))
        .filter(|h| query.created_at_after.map_or(true, |after| h.created_at > after))
        .filter(|h| query.created_at_before.map_or(true, |before| h.created_at < before))
        .collect();

    Ok(Json(paginate(results, &query.page)))
}

#[derive(Deserialize)]
pub struct HolderDetailQuery {
    pub holder_id: String,
}

pub async fn get_holder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<HolderDetailQuery>,
) -> Result<Json<Holder>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("holders")?;

    let holder = state
        .store
        .get_holder(&query.holder_id)?
        .ok_or_else(|| LedgerError::not_found(format!("holder {} not found", query.holder_id)))?;
    Ok(Json(holder))
}

#[derive(Deserialize)]
pub struct CreateHolderRequest {
    pub holder_id: String,
    pub holder_type: Option<String>,
    pub info: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct CreateHolderResponse {
    #[serde(flatten)]
    pub holder: Holder,
    pub created_now: bool,
}

const DEFAULT_HOLDER_TYPE_SLUG: &str = "player";

pub async fn create_holder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateHolderRequest>,
) -> Result<(StatusCode, Json<CreateHolderResponse>), ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_create("holders")?;

    if let Some(existing) = state.store.get_holder(&request.holder_id)? {
        return Ok((
            StatusCode::OK,
            Json(CreateHolderResponse { holder: existing, created_now: false }),
        ));
    }

    let holder_type = request.holder_type.unwrap_or_else(|| DEFAULT_HOLDER_TYPE_SLUG.to_string());
    if state.store.get_holder_type(&holder_type)?.is_none() {
        state
            .store
            .put_holder_type(&ledger_core::HolderType::new(holder_type.clone()))?;
    }

    let mut holder = Holder::new(request.holder_id, holder_type);
    if let Some(info) = request.info {
        holder.info = info;
    }
    state.store.put_holder(&holder)?;

    Ok((StatusCode::CREATED, Json(CreateHolderResponse { holder, created_now: true })))
}

#[derive(Deserialize)]
pub struct UpdateHolderRequest {
    pub holder_id: String,
    pub enabled: Option<bool>,
    pub info: Option<serde_json::Value>,
}

pub async fn update_holder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdateHolderRequest>,
) -> Result<Json<Holder>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_update("holders")?;

    let mut holder = state
        .store
        .get_holder(&request.holder_id)?
        .ok_or_else(|| LedgerError::not_found(format!("holder {} not found", request.holder_id)))?;

    if let Some(enabled) = request.enabled {
        holder.enabled = enabled;
    }
    if let Some(info) = request.info {
        holder.info = info;
    }
    holder.updated_at = Utc::now();
    state.store.put_holder(&holder)?;

    Ok(Json(holder))
}
