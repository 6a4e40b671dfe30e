//! The HTTP surface (spec.md §6.1): an axum `Router` behind the HMAC
//! "wrapping decorator" in [`auth`], dispatching into `ledger-engine` and
//! gated by `ledger-permissions`.

pub mod auth;
pub mod error;
pub mod pagination;
pub mod permissions;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

    Router::new()
        .route("/holders/", get(routes::holders::list_holders))
        .route("/holders/detail/", get(routes::holders::get_holder))
        .route("/holders/create/", post(routes::holders::create_holder))
        .route("/holders/update/", post(routes::holders::update_holder))
        .route("/accounts/", get(routes::accounts::list_accounts))
        .route("/accounts/detail/", get(routes::accounts::get_account))
        .route("/units/", get(routes::units::list_units))
        .route("/adjustments/", get(routes::adjustments::list_adjustments))
        .route("/adjustments/create/", post(routes::adjustments::create_adjustment))
        .route("/adjustments/confirm/", post(routes::adjustments::confirm_adjustment))
        .route("/adjustments/reject/", post(routes::adjustments::reject_adjustment))
        .route("/transfers/", get(routes::transfers::list_transfers))
        .route("/transfers/create/", post(routes::transfers::create_transfer))
        .route("/transfers/confirm/", post(routes::transfers::confirm_transfer))
        .route("/transfers/reject/", post(routes::transfers::reject_transfer))
        .route("/exchanges/", get(routes::exchanges::list_exchanges))
        .route("/exchanges/create/", post(routes::exchanges::create_exchange))
        .route("/exchanges/confirm/", post(routes::exchanges::confirm_exchange))
        .route("/exchanges/reject/", post(routes::exchanges::reject_exchange))
        .layer(middleware::from_fn_with_state(state.clone(), auth::hmac_auth))
        .layer(cors)
        .with_state(state)
}

/// Binds and serves the router until the process is killed. The host binary
/// owns process lifetime; this never returns on success.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_auth::HmacConfig;
    use ledger_core::{CurrencyService, Holder};
    use ledger_store::Store;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut service = CurrencyService::new("svc");
        service.permissions = serde_json::json!({ "root": true });
        store.put_service(&service).unwrap();

        let mut config = HmacConfig::default();
        config.enable_hmac_validation = false;
        AppState::new(Arc::new(store), Arc::new(config))
    }

    #[tokio::test]
    async fn missing_service_header_is_rejected() {
        let app = router(test_state());
        let request = axum::http::Request::builder()
            .uri("/holders/")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_list_holders_round_trips_through_the_router() {
        let state = test_state();
        state.store.put_holder(&Holder::new("p1", "player")).unwrap();
        let app = router(state);

        let request = axum::http::Request::builder()
            .uri("/holders/")
            .header("X-SERVICE", "svc")
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
