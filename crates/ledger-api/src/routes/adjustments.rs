use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ledger_core::{AdjustmentTransaction, Decimal};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::pagination::{paginate, Page, PageParams};
use crate::permissions::ServicePermissions;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ListAdjustmentsQuery {
    pub holder_id: Option<String>,
    pub currency_unit: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

pub async fn list_adjustments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListAdjustmentsQuery>,
) -> Result<Json<Page<AdjustmentTransaction>>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("adjustments")?;

    let results = state
        .store
        .iter_adjustments()?
        .into_iter()
        .filter(|tx| query.holder_id.as_deref().map_or(true, |id| tx.holder_id == id))
        .filter(|tx| query.currency_unit.as_deref().map_or(true, |u| tx.currency_unit == u))
        .collect();
    Ok(Json(paginate(results, &query.page)))
}

#[derive(Deserialize)]
pub struct CreateAdjustmentRequest {
    pub holder_id: String,
    pub currency_unit: String,
    pub amount: Decimal,
    pub description: String,
    pub auto_reject_after_seconds: Option<i64>,
}

pub async fn create_adjustment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateAdjustmentRequest>,
) -> Result<(StatusCode, Json<AdjustmentTransaction>), ApiError> {
    let permissions = ServicePermissions::resolve(&state, &auth)?;
    permissions.enforce_create("adjustments")?;
    permissions.enforce_amount("adjustments", request.amount)?;
    let timeout_seconds = request.auto_reject_after_seconds.unwrap_or(state.default_auto_reject.num_seconds());
    permissions.enforce_auto_reject_timeout("adjustments", timeout_seconds)?;

    let auto_reject_after = chrono::Utc::now() + chrono::Duration::seconds(timeout_seconds);
    let tx = ledger_engine::adjustments::create(
        &state.store,
        &auth.service_name,
        &request.holder_id,
        &request.currency_unit,
        request.amount,
        &request.description,
        auto_reject_after,
    )?;
    Ok((StatusCode::CREATED, Json(tx)))
}

#[derive(Deserialize)]
pub struct CloseAdjustmentRequest {
    pub uuid: Uuid,
    #[serde(default)]
    pub status_description: String,
}

pub async fn confirm_adjustment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CloseAdjustmentRequest>,
) -> Result<Json<AdjustmentTransaction>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_confirm("adjustments", &auth.service_name)?;
    let tx = ledger_engine::adjustments::confirm(&state.store, request.uuid, &request.status_description)?;
    Ok(Json(tx))
}

pub async fn reject_adjustment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CloseAdjustmentRequest>,
) -> Result<Json<AdjustmentTransaction>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_reject("adjustments", &auth.service_name)?;
    let tx = ledger_engine::adjustments::reject(&state.store, request.uuid, &request.status_description)?;
    Ok(Json(tx))
}
