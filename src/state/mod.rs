//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::product::ProductService;
use crate::rental::RentalService;
use crate::scheduler::AutoRefundJob;
use crate::shop::ShopService;
use crate::wallet::WalletLedger;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: Arc<AuthService>,
    pub shop_service: Arc<ShopService>,
    pub product_service: Arc<ProductService>,
    pub rental_service: Arc<RentalService>,
    pub wallet_ledger: Arc<WalletLedger>,
    pub auto_refund_job: Arc<AutoRefundJob>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: PgPool,
        auth_service: Arc<AuthService>,
        shop_service: Arc<ShopService>,
        product_service: Arc<ProductService>,
        rental_service: Arc<RentalService>,
        wallet_ledger: Arc<WalletLedger>,
        auto_refund_job: Arc<AutoRefundJob>,
    ) -> Self {
        Self {
            db_pool,
            auth_service,
            shop_service,
            product_service,
            rental_service,
            wallet_ledger,
            auto_refund_job,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<ShopService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.shop_service.clone()
    }
}

impl FromRef<AppState> for Arc<ProductService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.product_service.clone()
    }
}

impl FromRef<AppState> for Arc<RentalService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rental_service.clone()
    }
}

impl FromRef<AppState> for Arc<WalletLedger> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.wallet_ledger.clone()
    }
}
