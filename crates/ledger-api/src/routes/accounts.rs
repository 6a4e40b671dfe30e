use axum::extract::{Extension, Query, State};
use axum::Json;
use ledger_core::{CheckingAccount, LedgerError};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::pagination::{paginate, Page, PageParams};
use crate::permissions::ServicePermissions;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ListAccountsQuery {
    pub holder_id: Option<String>,
    pub currency_unit: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<Page<CheckingAccount>>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("accounts")?;

    let results = state
        .store
        .iter_accounts()?
        .into_iter()
        .filter(|a| query.holder_id.as_deref().map_or(true, |id| a.holder_id == id))
        .filter(|a| query.currency_unit.as_deref().map_or(true, |u| a.currency_unit == u))
        .collect();

    Ok(Json(paginate(results, &query.page)))
}

#[derive(Deserialize)]
pub struct AccountDetailQuery {
    pub holder_id: String,
    pub currency_unit: String,
}

pub async fn get_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AccountDetailQuery>,
) -> Result<Json<CheckingAccount>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("accounts")?;

    let account = state
        .store
        .get_account(&query.holder_id, &query.currency_unit)?
        .ok_or_else(|| {
            LedgerError::not_found(format!(
                "no account for holder {} in unit {}",
                query.holder_id, query.currency_unit
            ))
        })?;
    Ok(Json(account))
}
