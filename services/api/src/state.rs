//! Application state shared across handlers

use std::sync::Arc;

use crate::jwt::JwtService;
use crate::repositories::{
    AccountRepository, ProductRepository, ReceiptRepository, ShopRepository,
};
use crate::store::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub account_repository: AccountRepository,
    pub shop_repository: ShopRepository,
    pub product_repository: ProductRepository,
    pub receipt_repository: ReceiptRepository,
}

impl AppState {
    /// Wire every repository to the same store
    pub fn new(store: Arc<dyn Store>, jwt_service: JwtService) -> Self {
        Self {
            jwt_service,
            account_repository: AccountRepository::new(store.clone()),
            shop_repository: ShopRepository::new(store.clone()),
            product_repository: ProductRepository::new(store.clone()),
            receipt_repository: ReceiptRepository::new(store),
        }
    }
}
