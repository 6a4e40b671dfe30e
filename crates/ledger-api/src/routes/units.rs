use axum::extract::{Extension, Query, State};
use axum::Json;
use ledger_core::CurrencyUnit;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::pagination::{paginate, Page, PageParams};
use crate::permissions::ServicePermissions;
use crate::state::AppState;

pub async fn list_units(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<PageParams>,
) -> Result<Json<Page<CurrencyUnit>>, ApiError> {
    ServicePermissions::resolve(&state, &auth)?.enforce_access("units")?;

    Ok(Json(paginate(state.store.iter_currency_units()?, &page)))
}
