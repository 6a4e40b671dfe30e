use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ledger_core::ExchangeTransaction;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::pagination::{paginate, Page, PageParams};
use crate::permissions::ServicePermissions;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ListExchangesQuery {
    pub holder_id: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

pub async fn list_exchanges(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListExchangesQuery>,
) -> Result<Json<Page<ExchangeTransaction>>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("exchanges")?;

    let results = state
        .store
        .iter_exchanges()?
        .into_iter()
        .filter(|tx| query.holder_id.as_deref().map_or(true, |id| tx.holder_id == id))
        .collect();
    Ok(Json(paginate(results, &query.page)))
}

#[derive(Deserialize)]
pub struct CreateExchangeRequest {
    pub exchange_rule: String,
    pub holder_id: String,
    pub from_unit: String,
    pub to_unit: String,
    pub from_amount: ledger_core::Decimal,
    pub description: String,
    pub auto_reject_after_seconds: Option<i64>,
}

pub async fn create_exchange(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateExchangeRequest>,
) -> Result<(StatusCode, Json<ExchangeTransaction>), ApiError> {
    let permissions = ServicePermissions::resolve(&state, &auth)?;
    permissions.enforce_create("exchanges")?;
    permissions.enforce_amount("exchanges", request.from_amount)?;
    let timeout_seconds = request.auto_reject_after_seconds.unwrap_or(state.default_auto_reject.num_seconds());
    permissions.enforce_auto_reject_timeout("exchanges", timeout_seconds)?;

    let auto_reject_after = chrono::Utc::now() + chrono::Duration::seconds(timeout_seconds);
    let tx = ledger_engine::exchanges::create(
        &state.store,
        &auth.service_name,
        &request.holder_id,
        &request.exchange_rule,
        &request.from_unit,
        &request.to_unit,
        request.from_amount,
        &request.description,
        auto_reject_after,
    )?;
    Ok((StatusCode::CREATED, Json(tx)))
}

#[derive(Deserialize)]
pub struct CloseExchangeRequest {
    pub uuid: Uuid,
    #[serde(default)]
    pub status_description: String,
}

pub async fn confirm_exchange(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CloseExchangeRequest>,
) -> Result<Json<ExchangeTransaction>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_confirm("exchanges", &auth.service_name)?;
    let tx = ledger_engine::exchanges::confirm(&state.store, request.uuid, &request.status_description)?;
    Ok(Json(tx))
}

pub async fn reject_exchange(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CloseExchangeRequest>,
) -> Result<Json<ExchangeTransaction>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_reject("exchanges", &auth.service_name)?;
    let tx = ledger_engine::exchanges::reject(&state.store, request.uuid, &request.status_description)?;
    Ok(Json(tx))
}
