//! Shop and location models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Geographic location owned by a single shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub shop: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// Shop entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub id: Uuid,
    pub name: String,
    pub locations: Vec<Location>,
    /// Best-effort index of products with receipts at this shop
    pub products: Vec<Uuid>,
}

/// Location payload used when creating shops and adding locations
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, alias = "location")]
    pub address: Option<String>,
}

/// Location update payload
#[derive(Debug, Clone, Default)]
pub struct LocationChanges {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

/// Request for shop creation
#[derive(Debug, Deserialize)]
pub struct CreateShopRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub locations: Vec<NewLocation>,
}

/// Request for attaching a location to an existing shop
#[derive(Debug, Deserialize)]
pub struct AddLocationRequest {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, alias = "location")]
    pub address: Option<String>,
}

/// Fields an administrator may change on a shop
#[derive(Debug, Default, Deserialize)]
pub struct ShopUpdates {
    pub name: Option<String>,
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

/// Fields an administrator may change on a location
#[derive(Debug, Default, Deserialize)]
pub struct LocationUpdates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

/// `?name=` query
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

/// `?name=&barcode=` query addressing a product within a shop
#[derive(Debug, Deserialize)]
pub struct ShopProductQuery {
    pub name: Option<String>,
    pub barcode: Option<String>,
}

/// Response carrying a message and the affected shop
#[derive(Debug, Serialize)]
pub struct ShopMessageResponse {
    pub message: String,
    pub shop: Shop,
}
