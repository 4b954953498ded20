//! Document store seam
//!
//! Repositories talk to persistence only through [`Store`]. Two backends are
//! provided: [`PgStore`] on PostgreSQL and [`MemoryStore`] held in process.
//!
//! References between documents are plain ids with no enforced integrity.
//! The multi-document sequences (receipt insert plus index maintenance and
//! the product and shop cascades) are single calls so each backend can run
//! them atomically.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Account, AccountChanges, Location, LocationChanges, NewAccount, NewLocation, NewProduct,
    NewReceipt, Nutrients, Page, Product, ProductChanges, Receipt, ReceiptFilter, Shop,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors raised by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique key is already taken
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// Error raised by the database driver
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

/// Data-access layer for every collection of the service.
///
/// Lookups return `Ok(None)` when nothing matches. Updates and deletes
/// addressed by id also return `Ok(None)` when the document is gone.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert an account. Fails with `Duplicate` on a taken username.
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account>;

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    /// Apply the given changes. Fails with `Duplicate` on a taken username.
    async fn update_account(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> StoreResult<Option<Account>>;

    async fn delete_account(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Insert a shop together with its initial locations.
    async fn insert_shop(&self, name: &str, locations: Vec<NewLocation>) -> StoreResult<Shop>;

    async fn find_shop_by_name(&self, name: &str) -> StoreResult<Option<Shop>>;

    async fn find_shop_by_id(&self, id: Uuid) -> StoreResult<Option<Shop>>;

    /// Shops whose name contains `fragment`, ignoring case; all shops without one.
    async fn search_shops(&self, fragment: Option<&str>) -> StoreResult<Vec<Shop>>;

    async fn rename_shop(&self, id: Uuid, name: &str) -> StoreResult<Option<Shop>>;

    /// Remove `product` from the shop's product index.
    async fn pull_shop_product(&self, shop: Uuid, product: Uuid) -> StoreResult<Option<Shop>>;

    /// Delete the shop, its locations and every receipt taken at it.
    async fn delete_shop_cascade(&self, id: Uuid) -> StoreResult<Option<Shop>>;

    async fn insert_location(&self, shop: Uuid, location: NewLocation) -> StoreResult<Location>;

    async fn find_location(&self, id: Uuid) -> StoreResult<Option<Location>>;

    async fn update_location(
        &self,
        id: Uuid,
        changes: LocationChanges,
    ) -> StoreResult<Option<Location>>;

    async fn delete_location(&self, id: Uuid) -> StoreResult<Option<Location>>;

    /// Insert a product and its nutrients document. Fails with `Duplicate` on a taken barcode.
    async fn insert_product(&self, product: NewProduct) -> StoreResult<Product>;

    async fn find_product_by_barcode(&self, barcode: &str) -> StoreResult<Option<Product>>;

    async fn find_product_by_id(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Products whose name contains `fragment`, ignoring case; all products without one.
    async fn search_products(&self, fragment: Option<&str>) -> StoreResult<Vec<Product>>;

    async fn find_nutrients(&self, id: Uuid) -> StoreResult<Option<Nutrients>>;

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>>;

    /// Delete the product, its nutrients and receipts, and pull it from every
    /// shop and account product index.
    async fn delete_product_cascade(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Insert a receipt and append its product to the shop's and the
    /// submitter's product index when absent. Returns the receipt and the
    /// shop as it stands afterwards, or `None` if the shop vanished.
    async fn insert_receipt(&self, receipt: NewReceipt) -> StoreResult<(Receipt, Option<Shop>)>;

    async fn find_receipt(&self, id: Uuid) -> StoreResult<Option<Receipt>>;

    /// Matching receipts, most recent first, ties in insertion order.
    async fn find_receipts(&self, filter: &ReceiptFilter, page: Page)
    -> StoreResult<Vec<Receipt>>;

    async fn delete_receipt(&self, id: Uuid) -> StoreResult<Option<Receipt>>;

    /// Delete every matching receipt and return how many went.
    async fn delete_receipts(&self, filter: &ReceiptFilter) -> StoreResult<u64>;
}
