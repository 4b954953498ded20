//! In-process document store
//!
//! Every collection lives behind one mutex, so each trait call, cascades
//! included, observes and leaves a consistent snapshot. Used for local runs
//! (`STORE_BACKEND=memory`) and by the test suite.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Account, AccountChanges, Location, LocationChanges, NewAccount, NewLocation, NewProduct,
    NewReceipt, Nutrients, Page, Product, ProductChanges, Receipt, ReceiptFilter, Shop,
};

/// Shop as stored; locations live in their own collection
#[derive(Debug, Clone)]
struct ShopDocument {
    id: Uuid,
    name: String,
    products: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct Collections {
    accounts: Vec<Account>,
    shops: Vec<ShopDocument>,
    locations: Vec<Location>,
    products: Vec<Product>,
    nutrients: Vec<Nutrients>,
    receipts: Vec<Receipt>,
}

impl Collections {
    fn shop(&self, document: &ShopDocument) -> Shop {
        Shop {
            id: document.id,
            name: document.name.clone(),
            locations: self
                .locations
                .iter()
                .filter(|l| l.shop == document.id)
                .cloned()
                .collect(),
            products: document.products.clone(),
        }
    }

    fn shop_by_id(&self, id: Uuid) -> Option<Shop> {
        self.shops
            .iter()
            .find(|s| s.id == id)
            .map(|s| self.shop(s))
    }
}

fn contains_ignore_case(haystack: &str, fragment: Option<&str>) -> bool {
    fragment.is_none_or(|f| haystack.to_lowercase().contains(&f.to_lowercase()))
}

fn push_unique(list: &mut Vec<Uuid>, id: Uuid) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a receipt exactly as given, bypassing index maintenance.
    ///
    /// Lets fixtures seed historical observations with fixed ids and dates.
    pub async fn seed_receipt(&self, receipt: Receipt) {
        self.inner.lock().await.receipts.push(receipt);
    }

    /// Overwrite a shop's product index, bypassing receipts.
    pub async fn seed_shop_products(&self, shop: Uuid, products: Vec<Uuid>) {
        let mut inner = self.inner.lock().await;
        if let Some(document) = inner.shops.iter_mut().find(|s| s.id == shop) {
            document.products = products;
        }
    }

    /// Total number of receipts held
    pub async fn receipt_count(&self) -> usize {
        self.inner.lock().await.receipts.len()
    }

    /// Total number of nutrients documents held
    pub async fn nutrients_count(&self) -> usize {
        self.inner.lock().await.nutrients.len()
    }

    /// Total number of locations held
    pub async fn location_count(&self) -> usize {
        self.inner.lock().await.locations.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        let mut inner = self.inner.lock().await;
        if inner.accounts.iter().any(|a| a.username == account.username) {
            return Err(StoreError::Duplicate {
                field: "username",
                value: account.username,
            });
        }

        let account = Account {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            products: Vec::new(),
            created_at: Utc::now(),
        };
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> StoreResult<Option<Account>> {
        let mut inner = self.inner.lock().await;
        if let Some(username) = &changes.username
            && inner
                .accounts
                .iter()
                .any(|a| a.id != id && &a.username == username)
        {
            return Err(StoreError::Duplicate {
                field: "username",
                value: username.clone(),
            });
        }

        let Some(account) = inner.accounts.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            account.username = username;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            account.password_hash = password_hash;
        }
        Ok(Some(account.clone()))
    }

    async fn delete_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let mut inner = self.inner.lock().await;
        let position = inner.accounts.iter().position(|a| a.id == id);
        Ok(position.map(|i| inner.accounts.remove(i)))
    }

    async fn insert_shop(&self, name: &str, locations: Vec<NewLocation>) -> StoreResult<Shop> {
        let mut inner = self.inner.lock().await;
        if inner.shops.iter().any(|s| s.name == name) {
            return Err(StoreError::Duplicate {
                field: "name",
                value: name.to_string(),
            });
        }

        let document = ShopDocument {
            id: Uuid::new_v4(),
            name: name.to_string(),
            products: Vec::new(),
        };
        for location in locations {
            inner.locations.push(Location {
                id: Uuid::new_v4(),
                shop: document.id,
                latitude: location.latitude,
                longitude: location.longitude,
                address: location.address,
            });
        }
        let shop = inner.shop(&document);
        inner.shops.push(document);
        Ok(shop)
    }

    async fn find_shop_by_name(&self, name: &str) -> StoreResult<Option<Shop>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .shops
            .iter()
            .find(|s| s.name == name)
            .map(|s| inner.shop(s)))
    }

    async fn find_shop_by_id(&self, id: Uuid) -> StoreResult<Option<Shop>> {
        Ok(self.inner.lock().await.shop_by_id(id))
    }

    async fn search_shops(&self, fragment: Option<&str>) -> StoreResult<Vec<Shop>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .shops
            .iter()
            .filter(|s| contains_ignore_case(&s.name, fragment))
            .map(|s| inner.shop(s))
            .collect())
    }

    async fn rename_shop(&self, id: Uuid, name: &str) -> StoreResult<Option<Shop>> {
        let mut inner = self.inner.lock().await;
        if inner.shops.iter().any(|s| s.id != id && s.name == name) {
            return Err(StoreError::Duplicate {
                field: "name",
                value: name.to_string(),
            });
        }

        let Some(document) = inner.shops.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        document.name = name.to_string();
        Ok(inner.shop_by_id(id))
    }

    async fn pull_shop_product(&self, shop: Uuid, product: Uuid) -> StoreResult<Option<Shop>> {
        let mut inner = self.inner.lock().await;
        let Some(document) = inner.shops.iter_mut().find(|s| s.id == shop) else {
            return Ok(None);
        };
        document.products.retain(|p| *p != product);
        Ok(inner.shop_by_id(shop))
    }

    async fn delete_shop_cascade(&self, id: Uuid) -> StoreResult<Option<Shop>> {
        let mut inner = self.inner.lock().await;
        let Some(position) = inner.shops.iter().position(|s| s.id == id) else {
            return Ok(None);
        };

        let document = inner.shops.remove(position);
        let shop = inner.shop(&document);
        inner.locations.retain(|l| l.shop != id);
        inner.receipts.retain(|r| r.shop != id);
        Ok(Some(shop))
    }

    async fn insert_location(&self, shop: Uuid, location: NewLocation) -> StoreResult<Location> {
        let location = Location {
            id: Uuid::new_v4(),
            shop,
            latitude: location.latitude,
            longitude: location.longitude,
            address: location.address,
        };
        self.inner.lock().await.locations.push(location.clone());
        Ok(location)
    }

    async fn find_location(&self, id: Uuid) -> StoreResult<Option<Location>> {
        let inner = self.inner.lock().await;
        Ok(inner.locations.iter().find(|l| l.id == id).cloned())
    }

    async fn update_location(
        &self,
        id: Uuid,
        changes: LocationChanges,
    ) -> StoreResult<Option<Location>> {
        let mut inner = self.inner.lock().await;
        let Some(location) = inner.locations.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        if let Some(latitude) = changes.latitude {
            location.latitude = latitude;
        }
        if let Some(longitude) = changes.longitude {
            location.longitude = longitude;
        }
        if changes.address.is_some() {
            location.address = changes.address;
        }
        Ok(Some(location.clone()))
    }

    async fn delete_location(&self, id: Uuid) -> StoreResult<Option<Location>> {
        let mut inner = self.inner.lock().await;
        let position = inner.locations.iter().position(|l| l.id == id);
        Ok(position.map(|i| inner.locations.remove(i)))
    }

    async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
        let mut inner = self.inner.lock().await;
        if inner.products.iter().any(|p| p.barcode == product.barcode) {
            return Err(StoreError::Duplicate {
                field: "barcode",
                value: product.barcode,
            });
        }

        let id = Uuid::new_v4();
        let nutrients = Nutrients {
            id: Uuid::new_v4(),
            product: id,
            values: product.nutrients,
        };
        let product = Product {
            id,
            barcode: product.barcode,
            name: product.name,
            brand: product.brand,
            image: product.image,
            ingredients: product.ingredients,
            nutrients: nutrients.id,
            beverage: product.beverage,
            nutri_score: product.nutri_score,
        };
        inner.nutrients.push(nutrients);
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn find_product_by_barcode(&self, barcode: &str) -> StoreResult<Option<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .iter()
            .find(|p| p.barcode == barcode)
            .cloned())
    }

    async fn find_product_by_id(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn search_products(&self, fragment: Option<&str>) -> StoreResult<Vec<Product>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .iter()
            .filter(|p| contains_ignore_case(&p.name, fragment))
            .cloned()
            .collect())
    }

    async fn find_nutrients(&self, id: Uuid) -> StoreResult<Option<Nutrients>> {
        let inner = self.inner.lock().await;
        Ok(inner.nutrients.iter().find(|n| n.id == id).cloned())
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        let mut inner = self.inner.lock().await;
        let Some(product) = inner.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(brand) = changes.brand {
            product.brand = brand;
        }
        if let Some(image) = changes.image {
            product.image = image;
        }
        if let Some(ingredients) = changes.ingredients {
            product.ingredients = ingredients;
        }
        if let Some(beverage) = changes.beverage {
            product.beverage = beverage;
        }
        if let Some(nutri_score) = changes.nutri_score {
            product.nutri_score = nutri_score;
        }
        let product = product.clone();

        if let Some(patch) = changes.nutrients
            && let Some(nutrients) = inner.nutrients.iter_mut().find(|n| n.id == product.nutrients)
        {
            nutrients.values.apply(&patch);
        }
        Ok(Some(product))
    }

    async fn delete_product_cascade(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let mut inner = self.inner.lock().await;
        let Some(position) = inner.products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let product = inner.products.remove(position);
        inner.nutrients.retain(|n| n.id != product.nutrients);
        inner.receipts.retain(|r| r.product != id);
        for shop in inner.shops.iter_mut() {
            shop.products.retain(|p| *p != id);
        }
        for account in inner.accounts.iter_mut() {
            account.products.retain(|p| *p != id);
        }
        Ok(Some(product))
    }

    async fn insert_receipt(&self, receipt: NewReceipt) -> StoreResult<(Receipt, Option<Shop>)> {
        let mut inner = self.inner.lock().await;
        let receipt = Receipt {
            id: Uuid::new_v4(),
            price: receipt.price,
            date: receipt.date,
            product: receipt.product,
            shop: receipt.shop,
            user: receipt.user,
        };
        inner.receipts.push(receipt.clone());

        if let Some(shop) = inner.shops.iter_mut().find(|s| s.id == receipt.shop) {
            push_unique(&mut shop.products, receipt.product);
        }
        if let Some(account) = inner.accounts.iter_mut().find(|a| a.id == receipt.user) {
            push_unique(&mut account.products, receipt.product);
        }

        let shop = inner.shop_by_id(receipt.shop);
        Ok((receipt, shop))
    }

    async fn find_receipt(&self, id: Uuid) -> StoreResult<Option<Receipt>> {
        let inner = self.inner.lock().await;
        Ok(inner.receipts.iter().find(|r| r.id == id).cloned())
    }

    async fn find_receipts(
        &self,
        filter: &ReceiptFilter,
        page: Page,
    ) -> StoreResult<Vec<Receipt>> {
        let inner = self.inner.lock().await;
        let mut receipts: Vec<Receipt> = inner
            .receipts
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        drop(inner);

        // stable sort keeps insertion order among equal dates
        receipts.sort_by(|a, b| b.date.cmp(&a.date));

        let window = receipts.into_iter().skip(page.skip as usize);
        Ok(match page.limit {
            0 => window.collect(),
            limit => window.take(limit as usize).collect(),
        })
    }

    async fn delete_receipt(&self, id: Uuid) -> StoreResult<Option<Receipt>> {
        let mut inner = self.inner.lock().await;
        let position = inner.receipts.iter().position(|r| r.id == id);
        Ok(position.map(|i| inner.receipts.remove(i)))
    }

    async fn delete_receipts(&self, filter: &ReceiptFilter) -> StoreResult<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.receipts.len();
        inner.receipts.retain(|r| !filter.matches(r));
        Ok((before - inner.receipts.len()) as u64)
    }
}
