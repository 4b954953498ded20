//! Domain entities plus the request and response payloads of the API

use serde_json::{Map, Value};

pub mod account;
pub mod product;
pub mod receipt;
pub mod shop;

pub use account::{
    Account, AccountChanges, AccountDeleteRequest, AccountPatchRequest, AccountResponse,
    AccountUpdatedResponse, AccountUpdates, LoginRequest, LoginResponse, NewAccount, Role,
    SignupRequest,
};
pub use product::{
    BarcodeQuery, CreateProductRequest, NewProduct, NutriScore, NutrientValues, Nutrients,
    NutrientsPatch, Product, ProductChanges, ProductResponse, ProductUpdates,
};
pub use receipt::{
    CreateReceiptRequest, IdMatch, NewReceipt, Page, ProductSummary, Receipt,
    ReceiptCreatedResponse, ReceiptFilter, ReceiptListResponse, ReceiptView,
    ReceiptsDeletedResponse, ShopSummary,
};
pub use shop::{
    AddLocationRequest, CreateShopRequest, Location, LocationChanges, LocationUpdates,
    NameQuery, NewLocation, Shop, ShopMessageResponse, ShopProductQuery, ShopUpdates,
};

/// Keys of a patch body that fell outside the allow-list of its route.
///
/// Patch payloads capture unrecognised keys with `#[serde(flatten)]` so the
/// whole update can be rejected before anything is applied.
pub fn rejected_keys(unknown: &Map<String, Value>) -> Vec<&str> {
    unknown.keys().map(String::as_str).collect()
}
