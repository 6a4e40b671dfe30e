use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ledger_core::TransferTransaction;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::pagination::{paginate, Page, PageParams};
use crate::permissions::ServicePermissions;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ListTransfersQuery {
    pub from_holder_id: Option<String>,
    pub to_holder_id: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

pub async fn list_transfers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListTransfersQuery>,
) -> Result<Json<Page<TransferTransaction>>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("transfers")?;

    let results = state
        .store
        .iter_transfers()?
        .into_iter()
        .filter(|tx| query.from_holder_id.as_deref().map_or(true, |id| tx.from_holder_id == id))
        .filter(|tx| query.to_holder_id.as_deref().map_or(true, |id| tx.to_holder_id == id))
        .collect();
    Ok(Json(paginate(results, &query.page)))
}

#[derive(Deserialize)]
pub struct CreateTransferRequest {
    pub transfer_rule: String,
    pub from_holder_id: String,
    pub to_holder_id: String,
    pub from_amount: ledger_core::Decimal,
    pub description: String,
    pub auto_reject_after_seconds: Option<i64>,
}

pub async fn create_transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateTransferRequest>,
) -> Result<(StatusCode, Json<TransferTransaction>), ApiError> {
    let permissions = ServicePermissions::resolve(&state, &auth)?;
    permissions.enforce_create("transfers")?;
    permissions.enforce_amount("transfers", request.from_amount)?;
    let timeout_seconds = request.auto_reject_after_seconds.unwrap_or(state.default_auto_reject.num_seconds());
    permissions.enforce_auto_reject_timeout("transfers", timeout_seconds)?;

    let auto_reject_after = chrono::Utc::now() + chrono::Duration::seconds(timeout_seconds);
    let tx = ledger_engine::transfers::create(
        &state.store,
        &auth.service_name,
        &request.transfer_rule,
        &request.from_holder_id,
        &request.to_holder_id,
        request.from_amount,
        &request.description,
        auto_reject_after,
    )?;
    Ok((StatusCode::CREATED, Json(tx)))
}

#[derive(Deserialize)]
pub struct CloseTransferRequest {
    pub uuid: Uuid,
    #[serde(default)]
    pub status_description: String,
}

pub async fn confirm_transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CloseTransferRequest>,
) -> Result<Json<TransferTransaction>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_confirm("transfers", &auth.service_name)?;
    let tx = ledger_engine::transfers::confirm(&state.store, request.uuid, &request.status_description)?;
    Ok(Json(tx))
}

pub async fn reject_transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CloseTransferRequest>,
) -> Result<Json<TransferTransaction>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_reject("transfers", &auth.service_name)?;
    let tx = ledger_engine::transfers::reject(&state.store, request.uuid, &request.status_description)?;
    Ok(Json(tx))
}
