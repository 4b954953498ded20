//! Receipt model: a single price observation of a product at a shop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::shop::Shop;

/// Receipt entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub price: f64,
    pub date: DateTime<Utc>,
    pub product: Uuid,
    pub shop: Uuid,
    pub user: Uuid,
}

/// New receipt creation payload with resolved references
#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub price: f64,
    pub date: DateTime<Utc>,
    pub product: Uuid,
    pub shop: Uuid,
    pub user: Uuid,
}

/// How a receipt reference column is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMatch {
    /// Reference equals this id
    Is(Uuid),
    /// A name or barcode filter was given but resolved to nothing; matches no receipt
    Unresolved,
}

impl IdMatch {
    pub fn matches(&self, id: Uuid) -> bool {
        match self {
            IdMatch::Is(expected) => *expected == id,
            IdMatch::Unresolved => false,
        }
    }
}

impl From<Option<Uuid>> for IdMatch {
    fn from(id: Option<Uuid>) -> Self {
        id.map_or(IdMatch::Unresolved, IdMatch::Is)
    }
}

/// Conjunction of receipt match clauses; `None` leaves a dimension unconstrained
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptFilter {
    pub shop: Option<IdMatch>,
    pub product: Option<IdMatch>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ReceiptFilter {
    pub fn matches(&self, receipt: &Receipt) -> bool {
        self.shop.is_none_or(|m| m.matches(receipt.shop))
            && self.product.is_none_or(|m| m.matches(receipt.product))
            && self.since.is_none_or(|since| receipt.date >= since)
            && self.until.is_none_or(|until| receipt.date <= until)
            && self.min_price.is_none_or(|min| receipt.price >= min)
            && self.max_price.is_none_or(|max| receipt.price <= max)
    }

    /// True when some clause can never be satisfied
    pub fn is_unsatisfiable(&self) -> bool {
        self.shop == Some(IdMatch::Unresolved) || self.product == Some(IdMatch::Unresolved)
    }
}

/// Pagination window applied after sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of receipts; zero means unlimited
    pub limit: u32,
    pub skip: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 10, skip: 0 }
    }
}

/// Request for recording a price observation
#[derive(Debug, Deserialize)]
pub struct CreateReceiptRequest {
    pub shop: Option<String>,
    pub barcode: Option<String>,
    /// Kept loose so non-numeric input is reported with the receipt message
    pub price: Option<Value>,
}

/// Shop fields joined onto a receipt
#[derive(Debug, Clone, Serialize)]
pub struct ShopSummary {
    pub id: Uuid,
    pub name: String,
}

/// Product fields joined onto a receipt
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub barcode: String,
}

/// Receipt with its shop and product populated
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptView {
    pub id: Uuid,
    pub price: f64,
    pub date: DateTime<Utc>,
    pub shop: Option<ShopSummary>,
    pub product: Option<ProductSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
}

/// Response for receipt listing
#[derive(Debug, Serialize)]
pub struct ReceiptListResponse {
    pub receipts: Vec<ReceiptView>,
}

/// Response for receipt creation
#[derive(Debug, Serialize)]
pub struct ReceiptCreatedResponse {
    pub message: String,
    pub shop: Shop,
    pub receipt: Receipt,
}

/// Response for bulk receipt deletion
#[derive(Debug, Serialize)]
pub struct ReceiptsDeletedResponse {
    pub message: String,
    pub deleted: u64,
}
