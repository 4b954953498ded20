//! Price-observation engine
//!
//! Records receipts against resolved shops and products, answers filtered and
//! paginated listings, and performs guarded bulk deletion. Name and barcode
//! filters are resolved to ids first; one that resolves to nothing matches no
//! receipt rather than failing the request.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Account, CreateReceiptRequest, IdMatch, NewReceipt, Page, ProductSummary, Receipt,
    ReceiptFilter, ReceiptView, Shop, ShopSummary,
};
use crate::store::Store;

/// Query keys accepted by bulk deletion
pub const FILTER_KEYS: [&str; 6] = ["product", "shop", "sdate", "edate", "minprice", "maxprice"];

const RECEIPT_INPUT: &str = "shop, barcode, and price needs to be provided";
const RECEIPT_NOT_FOUND: &str = "Receipt not found";

/// Receipt filter as given on the query string, before names are resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptCriteria {
    /// Shop name
    pub shop: Option<String>,
    /// Product barcode
    pub product: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Empty values count as absent
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub fn parse_date(key: &str, value: &str) -> ApiResult<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| ApiError::bad_request(format!("Invalid date for {}: {}", key, value)))
}

fn parse_price(key: &str, value: &str) -> ApiResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::bad_request(format!("Invalid price for {}: {}", key, value)))
}

fn parse_count(key: &str, value: &str) -> ApiResult<u32> {
    value.parse::<u32>().map_err(|_| {
        ApiError::bad_request(format!("{} must be a non-negative integer", key))
    })
}

impl ReceiptCriteria {
    /// Parse the filter keys out of a query string; unknown keys are ignored here
    pub fn from_params(params: &HashMap<String, String>) -> ApiResult<Self> {
        Ok(Self {
            shop: param(params, "shop").map(str::to_string),
            product: param(params, "product").map(str::to_string),
            since: param(params, "sdate")
                .map(|v| parse_date("sdate", v))
                .transpose()?,
            until: param(params, "edate")
                .map(|v| parse_date("edate", v))
                .transpose()?,
            min_price: param(params, "minprice")
                .map(|v| parse_price("minprice", v))
                .transpose()?,
            max_price: param(params, "maxprice")
                .map(|v| parse_price("maxprice", v))
                .transpose()?,
        })
    }
}

/// `limit` (default 10, zero for all) and `skip` (default 0)
pub fn page_from_params(params: &HashMap<String, String>) -> ApiResult<Page> {
    let defaults = Page::default();
    Ok(Page {
        limit: param(params, "limit")
            .map(|v| parse_count("limit", v))
            .transpose()?
            .unwrap_or(defaults.limit),
        skip: param(params, "skip")
            .map(|v| parse_count("skip", v))
            .transpose()?
            .unwrap_or(defaults.skip),
    })
}

/// Bulk deletion needs at least one key, and only known ones
pub fn check_delete_keys(params: &HashMap<String, String>) -> ApiResult<()> {
    let unknown: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|k| !FILTER_KEYS.contains(k))
        .collect();

    if params.is_empty() || !unknown.is_empty() {
        warn!("Rejected bulk receipt deletion with keys {:?}", unknown);
        return Err(ApiError::bad_request("No valid queries were given."));
    }
    Ok(())
}

/// Number or numeric string, strictly positive
fn parse_receipt_price(price: Option<&Value>) -> Option<f64> {
    let price = match price? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    (price.is_finite() && price > 0.0).then_some(price)
}

/// Receipt repository
#[derive(Clone)]
pub struct ReceiptRepository {
    store: Arc<dyn Store>,
}

impl ReceiptRepository {
    /// Create a new receipt repository
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record a price observation by `user` and return it with the updated shop
    pub async fn create(
        &self,
        user: &Account,
        request: CreateReceiptRequest,
    ) -> ApiResult<(Receipt, Shop)> {
        let (Some(shop_name), Some(barcode)) = (request.shop, request.barcode) else {
            return Err(ApiError::bad_request(RECEIPT_INPUT));
        };

        let shop = self
            .store
            .find_shop_by_name(&shop_name)
            .await?
            .ok_or_else(|| ApiError::not_found("Shop not found"))?;
        let product = self
            .store
            .find_product_by_barcode(&barcode)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))?;

        let price = parse_receipt_price(request.price.as_ref())
            .ok_or_else(|| ApiError::bad_request(RECEIPT_INPUT))?;

        let (receipt, shop) = self
            .store
            .insert_receipt(NewReceipt {
                price,
                date: Utc::now(),
                product: product.id,
                shop: shop.id,
                user: user.id,
            })
            .await?;
        let shop = shop.ok_or_else(|| ApiError::not_found("Shop not found"))?;

        info!(
            "Recorded price {} for {} at {} by {}",
            receipt.price, barcode, shop.name, user.username
        );
        Ok((receipt, shop))
    }

    /// Resolve shop names and barcodes to id matches
    pub async fn resolve(&self, criteria: &ReceiptCriteria) -> ApiResult<ReceiptFilter> {
        let shop = match &criteria.shop {
            Some(name) => Some(IdMatch::from(
                self.store.find_shop_by_name(name).await?.map(|s| s.id),
            )),
            None => None,
        };
        let product = match &criteria.product {
            Some(barcode) => Some(IdMatch::from(
                self.store
                    .find_product_by_barcode(barcode)
                    .await?
                    .map(|p| p.id),
            )),
            None => None,
        };

        Ok(ReceiptFilter {
            shop,
            product,
            since: criteria.since,
            until: criteria.until,
            min_price: criteria.min_price,
            max_price: criteria.max_price,
        })
    }

    /// Matching receipts, most recent first, with shop and product populated
    pub async fn list(&self, criteria: &ReceiptCriteria, page: Page) -> ApiResult<Vec<ReceiptView>> {
        let filter = self.resolve(criteria).await?;
        if filter.is_unsatisfiable() {
            debug!("Receipt filter {:?} references unknown shop or product", criteria);
            return Ok(Vec::new());
        }

        let receipts = self.store.find_receipts(&filter, page).await?;
        self.populate(receipts, false).await
    }

    pub async fn find(&self, id: Uuid) -> ApiResult<ReceiptView> {
        let receipt = self
            .store
            .find_receipt(id)
            .await?
            .ok_or_else(|| ApiError::not_found(RECEIPT_NOT_FOUND))?;

        self.populate_one(receipt).await
    }

    /// Delete every receipt matching the query string and return the count
    pub async fn delete_matching(&self, params: &HashMap<String, String>) -> ApiResult<u64> {
        check_delete_keys(params)?;
        let criteria = ReceiptCriteria::from_params(params)?;

        let filter = self.resolve(&criteria).await?;
        if filter.is_unsatisfiable() {
            return Ok(0);
        }

        let deleted = self.store.delete_receipts(&filter).await?;
        info!("Deleted {} receipt(s) matching {:?}", deleted, criteria);
        Ok(deleted)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<ReceiptView> {
        let receipt = self
            .store
            .delete_receipt(id)
            .await?
            .ok_or_else(|| ApiError::not_found(RECEIPT_NOT_FOUND))?;

        info!("Deleted receipt {}", id);
        self.populate_one(receipt).await
    }

    async fn populate_one(&self, receipt: Receipt) -> ApiResult<ReceiptView> {
        let mut views = self.populate(vec![receipt], true).await?;
        views.pop().ok_or(ApiError::InternalServerError)
    }

    /// Join shop and product summaries; dangling references come back empty
    async fn populate(&self, receipts: Vec<Receipt>, with_user: bool) -> ApiResult<Vec<ReceiptView>> {
        let mut shops: HashMap<Uuid, Option<ShopSummary>> = HashMap::new();
        let mut products: HashMap<Uuid, Option<ProductSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(receipts.len());

        for receipt in receipts {
            if !shops.contains_key(&receipt.shop) {
                let summary = self
                    .store
                    .find_shop_by_id(receipt.shop)
                    .await?
                    .map(|s| ShopSummary {
                        id: s.id,
                        name: s.name,
                    });
                shops.insert(receipt.shop, summary);
            }
            if !products.contains_key(&receipt.product) {
                let summary = self
                    .store
                    .find_product_by_id(receipt.product)
                    .await?
                    .map(|p| ProductSummary {
                        id: p.id,
                        name: p.name,
                        barcode: p.barcode,
                    });
                products.insert(receipt.product, summary);
            }

            views.push(ReceiptView {
                id: receipt.id,
                price: receipt.price,
                date: receipt.date,
                shop: shops.get(&receipt.shop).cloned().flatten(),
                product: products.get(&receipt.product).cloned().flatten(),
                user: with_user.then_some(receipt.user),
            });
        }

        Ok(views)
    }
}
