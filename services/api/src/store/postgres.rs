//! PostgreSQL document store
//!
//! Each collection maps to a table; the shop and account product indexes are
//! link tables ordered by a serial column. Multi-document operations run in a
//! single transaction.

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Account, AccountChanges, IdMatch, Location, LocationChanges, NewAccount, NewLocation,
    NewProduct, NewReceipt, NutrientValues, Nutrients, Page, Product, ProductChanges, Receipt,
    ReceiptFilter, Shop,
};

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, role, created_at";
const LOCATION_COLUMNS: &str = "id, shop_id, latitude, longitude, address";
const PRODUCT_COLUMNS: &str =
    "id, barcode, name, brand, image, ingredients, nutrients_id, beverage, nutri_score";
const NUTRIENT_COLUMNS: &str = "id, product_id, energy, total_fat, saturated_fat, \
     total_carbohydrates, total_sugars, protein, trans_fat, added_sugars, salt, sodium, fibre, \
     per_fruit_veg, cholesterol, d_vitamin, calcium, iron, potassium";
const RECEIPT_COLUMNS: &str = "id, price, date, product_id, shop_id, user_id";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn on_unique(err: sqlx::Error, field: &'static str, value: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate {
            field,
            value: value.to_string(),
        },
        _ => StoreError::Database(err),
    }
}

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

/// `ILIKE` pattern matching `fragment` anywhere, with wildcards escaped
fn contains_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn account_from_row(row: &PgRow, products: Vec<Uuid>) -> Result<Account, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(Account {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse().map_err(decode_error)?,
        products,
        created_at: row.try_get("created_at")?,
    })
}

fn location_from_row(row: &PgRow) -> Result<Location, sqlx::Error> {
    Ok(Location {
        id: row.try_get("id")?,
        shop: row.try_get("shop_id")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        address: row.try_get("address")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    let nutri_score: String = row.try_get("nutri_score")?;
    Ok(Product {
        id: row.try_get("id")?,
        barcode: row.try_get("barcode")?,
        name: row.try_get("name")?,
        brand: row.try_get("brand")?,
        image: row.try_get("image")?,
        ingredients: row.try_get("ingredients")?,
        nutrients: row.try_get("nutrients_id")?,
        beverage: row.try_get("beverage")?,
        nutri_score: nutri_score.parse().map_err(decode_error)?,
    })
}

fn nutrients_from_row(row: &PgRow) -> Result<Nutrients, sqlx::Error> {
    Ok(Nutrients {
        id: row.try_get("id")?,
        product: row.try_get("product_id")?,
        values: NutrientValues {
            energy: row.try_get("energy")?,
            total_fat: row.try_get("total_fat")?,
            saturated_fat: row.try_get("saturated_fat")?,
            total_carbohydrates: row.try_get("total_carbohydrates")?,
            total_sugars: row.try_get("total_sugars")?,
            protein: row.try_get("protein")?,
            trans_fat: row.try_get("trans_fat")?,
            added_sugars: row.try_get("added_sugars")?,
            salt: row.try_get("salt")?,
            sodium: row.try_get("sodium")?,
            fibre: row.try_get("fibre")?,
            per_fruit_veg: row.try_get("per_fruit_veg")?,
            cholesterol: row.try_get("cholesterol")?,
            d_vitamin: row.try_get("d_vitamin")?,
            calcium: row.try_get("calcium")?,
            iron: row.try_get("iron")?,
            potassium: row.try_get("potassium")?,
        },
    })
}

fn receipt_from_row(row: &PgRow) -> Result<Receipt, sqlx::Error> {
    Ok(Receipt {
        id: row.try_get("id")?,
        price: row.try_get("price")?,
        date: row.try_get("date")?,
        product: row.try_get("product_id")?,
        shop: row.try_get("shop_id")?,
        user: row.try_get("user_id")?,
    })
}

async fn account_products(conn: &mut PgConnection, id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT product_id FROM account_products WHERE account_id = $1 ORDER BY seq",
    )
    .bind(id)
    .fetch_all(conn)
    .await
}

/// Load a shop's locations and product index around its row
async fn shop_from_row(conn: &mut PgConnection, row: &PgRow) -> Result<Shop, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;

    let locations = sqlx::query(&format!(
        "SELECT {} FROM locations WHERE shop_id = $1 ORDER BY seq",
        LOCATION_COLUMNS
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .iter()
    .map(location_from_row)
    .collect::<Result<Vec<_>, _>>()?;

    let products = sqlx::query_scalar::<_, Uuid>(
        "SELECT product_id FROM shop_products WHERE shop_id = $1 ORDER BY seq",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Shop {
        id,
        name: row.try_get("name")?,
        locations,
        products,
    })
}

async fn load_shop(conn: &mut PgConnection, id: Uuid) -> Result<Option<Shop>, sqlx::Error> {
    let row = sqlx::query("SELECT id, name FROM shops WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(Some(shop_from_row(conn, &row).await?)),
        None => Ok(None),
    }
}

/// Append the filter's clauses; an unresolved reference short-circuits to no rows
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReceiptFilter) {
    builder.push(" WHERE TRUE");

    for (column, clause) in [("shop_id", filter.shop), ("product_id", filter.product)] {
        match clause {
            Some(IdMatch::Is(id)) => {
                builder.push(format!(" AND {} = ", column)).push_bind(id);
            }
            Some(IdMatch::Unresolved) => {
                builder.push(" AND FALSE");
            }
            None => {}
        }
    }
    if let Some(since) = filter.since {
        builder.push(" AND date >= ").push_bind(since);
    }
    if let Some(until) = filter.until {
        builder.push(" AND date <= ").push_bind(until);
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        let row = sqlx::query(&format!(
            "INSERT INTO accounts (id, username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique(e, "username", &account.username))?;

        Ok(account_from_row(&row, Vec::new())?)
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let products = account_products(&mut conn, row.try_get("id")?).await?;
        Ok(Some(account_from_row(&row, products)?))
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> StoreResult<Option<Account>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!(
            "UPDATE accounts SET username = COALESCE($2, username), \
             email = COALESCE($3, email), password_hash = COALESCE($4, password_hash) \
             WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| on_unique(e, "username", changes.username.as_deref().unwrap_or_default()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let products = account_products(&mut conn, id).await?;
        Ok(Some(account_from_row(&row, products)?))
    }

    async fn delete_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let mut tx = self.pool.begin().await?;
        let products = account_products(&mut tx, id).await?;

        let row = sqlx::query(&format!(
            "DELETE FROM accounts WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM account_products WHERE account_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(row
            .map(|row| account_from_row(&row, products))
            .transpose()?)
    }

    async fn insert_shop(&self, name: &str, locations: Vec<NewLocation>) -> StoreResult<Shop> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("INSERT INTO shops (id, name) VALUES ($1, $2) RETURNING id, name")
            .bind(Uuid::new_v4())
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| on_unique(e, "name", name))?;
        let shop_id: Uuid = row.try_get("id")?;

        for location in locations {
            sqlx::query(
                "INSERT INTO locations (id, shop_id, latitude, longitude, address) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(shop_id)
            .bind(location.latitude)
            .bind(location.longitude)
            .bind(location.address)
            .execute(&mut *tx)
            .await?;
        }

        let shop = shop_from_row(&mut tx, &row).await?;
        tx.commit().await?;
        Ok(shop)
    }

    async fn find_shop_by_name(&self, name: &str) -> StoreResult<Option<Shop>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id, name FROM shops WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(Some(shop_from_row(&mut conn, &row).await?)),
            None => Ok(None),
        }
    }

    async fn find_shop_by_id(&self, id: Uuid) -> StoreResult<Option<Shop>> {
        let mut conn = self.pool.acquire().await?;
        Ok(load_shop(&mut conn, id).await?)
    }

    async fn search_shops(&self, fragment: Option<&str>) -> StoreResult<Vec<Shop>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            "SELECT id, name FROM shops WHERE $1::text IS NULL OR name ILIKE $1 ORDER BY seq",
        )
        .bind(fragment.map(contains_pattern))
        .fetch_all(&mut *conn)
        .await?;

        let mut shops = Vec::with_capacity(rows.len());
        for row in &rows {
            shops.push(shop_from_row(&mut conn, row).await?);
        }
        Ok(shops)
    }

    async fn rename_shop(&self, id: Uuid, name: &str) -> StoreResult<Option<Shop>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("UPDATE shops SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| on_unique(e, "name", name))?;

        match row {
            Some(row) => Ok(Some(shop_from_row(&mut conn, &row).await?)),
            None => Ok(None),
        }
    }

    async fn pull_shop_product(&self, shop: Uuid, product: Uuid) -> StoreResult<Option<Shop>> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("DELETE FROM shop_products WHERE shop_id = $1 AND product_id = $2")
            .bind(shop)
            .bind(product)
            .execute(&mut *conn)
            .await?;

        Ok(load_shop(&mut conn, shop).await?)
    }

    async fn delete_shop_cascade(&self, id: Uuid) -> StoreResult<Option<Shop>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT id, name FROM shops WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let shop = shop_from_row(&mut tx, &row).await?;

        for statement in [
            "DELETE FROM receipts WHERE shop_id = $1",
            "DELETE FROM locations WHERE shop_id = $1",
            "DELETE FROM shop_products WHERE shop_id = $1",
            "DELETE FROM shops WHERE id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(Some(shop))
    }

    async fn insert_location(&self, shop: Uuid, location: NewLocation) -> StoreResult<Location> {
        let row = sqlx::query(&format!(
            "INSERT INTO locations (id, shop_id, latitude, longitude, address) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(shop)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(location_from_row(&row)?)
    }

    async fn find_location(&self, id: Uuid) -> StoreResult<Option<Location>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM locations WHERE id = $1",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(location_from_row).transpose()?)
    }

    async fn update_location(
        &self,
        id: Uuid,
        changes: LocationChanges,
    ) -> StoreResult<Option<Location>> {
        let row = sqlx::query(&format!(
            "UPDATE locations SET latitude = COALESCE($2, latitude), \
             longitude = COALESCE($3, longitude), address = COALESCE($4, address) \
             WHERE id = $1 RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .bind(changes.latitude)
        .bind(changes.longitude)
        .bind(changes.address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(location_from_row).transpose()?)
    }

    async fn delete_location(&self, id: Uuid) -> StoreResult<Option<Location>> {
        let row = sqlx::query(&format!(
            "DELETE FROM locations WHERE id = $1 RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(location_from_row).transpose()?)
    }

    async fn insert_product(&self, product: NewProduct) -> StoreResult<Product> {
        let id = Uuid::new_v4();
        let nutrients_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO products \
             (id, barcode, name, brand, image, ingredients, nutrients_id, beverage, nutri_score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.image)
        .bind(&product.ingredients)
        .bind(nutrients_id)
        .bind(product.beverage)
        .bind(product.nutri_score.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| on_unique(e, "barcode", &product.barcode))?;

        let values = &product.nutrients;
        sqlx::query(&format!(
            "INSERT INTO nutrients ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
            NUTRIENT_COLUMNS
        ))
        .bind(nutrients_id)
        .bind(id)
        .bind(values.energy)
        .bind(values.total_fat)
        .bind(values.saturated_fat)
        .bind(values.total_carbohydrates)
        .bind(values.total_sugars)
        .bind(values.protein)
        .bind(values.trans_fat)
        .bind(values.added_sugars)
        .bind(values.salt)
        .bind(values.sodium)
        .bind(values.fibre)
        .bind(values.per_fruit_veg)
        .bind(values.cholesterol)
        .bind(values.d_vitamin)
        .bind(values.calcium)
        .bind(values.iron)
        .bind(values.potassium)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product_from_row(&row)?)
    }

    async fn find_product_by_barcode(&self, barcode: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM products WHERE barcode = $1",
            PRODUCT_COLUMNS
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row).transpose()?)
    }

    async fn find_product_by_id(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row).transpose()?)
    }

    async fn search_products(&self, fragment: Option<&str>) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM products WHERE $1::text IS NULL OR name ILIKE $1 ORDER BY seq",
            PRODUCT_COLUMNS
        ))
        .bind(fragment.map(contains_pattern))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_nutrients(&self, id: Uuid) -> StoreResult<Option<Nutrients>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM nutrients WHERE id = $1",
            NUTRIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(nutrients_from_row).transpose()?)
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "UPDATE products SET name = COALESCE($2, name), brand = COALESCE($3, brand), \
             image = COALESCE($4, image), ingredients = COALESCE($5, ingredients), \
             beverage = COALESCE($6, beverage), nutri_score = COALESCE($7, nutri_score) \
             WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.brand)
        .bind(&changes.image)
        .bind(&changes.ingredients)
        .bind(changes.beverage)
        .bind(changes.nutri_score.map(|s| s.as_str()))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let product = product_from_row(&row)?;

        if let Some(patch) = &changes.nutrients {
            sqlx::query(
                "UPDATE nutrients SET energy = COALESCE($2, energy), \
                 total_fat = COALESCE($3, total_fat), \
                 saturated_fat = COALESCE($4, saturated_fat), \
                 total_carbohydrates = COALESCE($5, total_carbohydrates), \
                 total_sugars = COALESCE($6, total_sugars), \
                 protein = COALESCE($7, protein), \
                 trans_fat = COALESCE($8, trans_fat), \
                 added_sugars = COALESCE($9, added_sugars), \
                 salt = COALESCE($10, salt), \
                 sodium = COALESCE($11, sodium), \
                 fibre = COALESCE($12, fibre), \
                 per_fruit_veg = COALESCE($13, per_fruit_veg), \
                 cholesterol = COALESCE($14, cholesterol), \
                 d_vitamin = COALESCE($15, d_vitamin), \
                 calcium = COALESCE($16, calcium), \
                 iron = COALESCE($17, iron), \
                 potassium = COALESCE($18, potassium) \
                 WHERE id = $1",
            )
            .bind(product.nutrients)
            .bind(patch.energy)
            .bind(patch.total_fat)
            .bind(patch.saturated_fat)
            .bind(patch.total_carbohydrates)
            .bind(patch.total_sugars)
            .bind(patch.protein)
            .bind(patch.trans_fat)
            .bind(patch.added_sugars)
            .bind(patch.salt)
            .bind(patch.sodium)
            .bind(patch.fibre)
            .bind(patch.per_fruit_veg)
            .bind(patch.cholesterol)
            .bind(patch.d_vitamin)
            .bind(patch.calcium)
            .bind(patch.iron)
            .bind(patch.potassium)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(product))
    }

    async fn delete_product_cascade(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let product = product_from_row(&row)?;

        sqlx::query("DELETE FROM nutrients WHERE id = $1")
            .bind(product.nutrients)
            .execute(&mut *tx)
            .await?;
        for statement in [
            "DELETE FROM receipts WHERE product_id = $1",
            "DELETE FROM shop_products WHERE product_id = $1",
            "DELETE FROM account_products WHERE product_id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(Some(product))
    }

    async fn insert_receipt(&self, receipt: NewReceipt) -> StoreResult<(Receipt, Option<Shop>)> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "INSERT INTO receipts (id, price, date, product_id, shop_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            RECEIPT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(receipt.price)
        .bind(receipt.date)
        .bind(receipt.product)
        .bind(receipt.shop)
        .bind(receipt.user)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO shop_products (shop_id, product_id) VALUES ($1, $2) \
             ON CONFLICT (shop_id, product_id) DO NOTHING",
        )
        .bind(receipt.shop)
        .bind(receipt.product)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "INSERT INTO account_products (account_id, product_id) VALUES ($1, $2) \
             ON CONFLICT (account_id, product_id) DO NOTHING",
        )
        .bind(receipt.user)
        .bind(receipt.product)
        .execute(&mut *tx)
        .await?;

        let shop = load_shop(&mut tx, receipt.shop).await?;
        tx.commit().await?;
        Ok((receipt_from_row(&row)?, shop))
    }

    async fn find_receipt(&self, id: Uuid) -> StoreResult<Option<Receipt>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM receipts WHERE id = $1",
            RECEIPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(receipt_from_row).transpose()?)
    }

    async fn find_receipts(
        &self,
        filter: &ReceiptFilter,
        page: Page,
    ) -> StoreResult<Vec<Receipt>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM receipts", RECEIPT_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY date DESC, seq ASC");
        if page.limit > 0 {
            builder.push(" LIMIT ").push_bind(i64::from(page.limit));
        }
        builder.push(" OFFSET ").push_bind(i64::from(page.skip));

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(receipt_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn delete_receipt(&self, id: Uuid) -> StoreResult<Option<Receipt>> {
        let row = sqlx::query(&format!(
            "DELETE FROM receipts WHERE id = $1 RETURNING {}",
            RECEIPT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(receipt_from_row).transpose()?)
    }

    async fn delete_receipts(&self, filter: &ReceiptFilter) -> StoreResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM receipts");
        push_filter(&mut builder, filter);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
