//! Shop repository: shops, their locations and their product index

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    AddLocationRequest, CreateShopRequest, Location, LocationChanges, LocationUpdates,
    NewLocation, Shop, ShopProductQuery, ShopUpdates, rejected_keys,
};
use crate::store::{Store, StoreError};
use crate::validation::{validate_latitude, validate_location, validate_longitude};

const SHOP_NOT_FOUND: &str = "Shop not found";
const LOCATION_NOT_FOUND: &str = "Location not found";
const UPDATE_NOT_PERMITTED: &str = "Update is not permitted";

fn shop_exists(name: &str) -> ApiError {
    ApiError::conflict(format!("The shop {} already exists.", name))
}

fn shop_name(name: Option<String>) -> ApiResult<String> {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("A shop name needs to be provided"))
}

/// Shop repository
#[derive(Clone)]
pub struct ShopRepository {
    store: Arc<dyn Store>,
}

impl ShopRepository {
    /// Create a new shop repository
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_by_name(&self, name: &str) -> ApiResult<Shop> {
        self.store
            .find_shop_by_name(name)
            .await?
            .ok_or_else(|| ApiError::not_found(SHOP_NOT_FOUND))
    }

    /// Create a shop with its initial locations
    pub async fn create(&self, request: CreateShopRequest) -> ApiResult<Shop> {
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::bad_request("A name is required"))?;
        for location in &request.locations {
            validate_location(location).map_err(ApiError::BadRequest)?;
        }

        if self.store.find_shop_by_name(&name).await?.is_some() {
            return Err(shop_exists(&name));
        }

        info!(
            "Creating shop {} with {} location(s)",
            name,
            request.locations.len()
        );
        self.store
            .insert_shop(&name, request.locations)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => shop_exists(&name),
                other => other.into(),
            })
    }

    pub async fn find_by_name(&self, name: Option<String>) -> ApiResult<Shop> {
        self.require_by_name(&shop_name(name)?).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Shop> {
        self.store
            .find_shop_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(SHOP_NOT_FOUND))
    }

    /// Shops whose name contains `name`, ignoring case
    pub async fn search(&self, name: Option<String>) -> ApiResult<Vec<Shop>> {
        let fragment = name.filter(|n| !n.is_empty());
        Ok(self.store.search_shops(fragment.as_deref()).await?)
    }

    /// Add a location to an existing shop and return the shop
    pub async fn add_location(&self, request: AddLocationRequest) -> ApiResult<Shop> {
        let (Some(name), Some(latitude), Some(longitude)) =
            (request.name, request.latitude, request.longitude)
        else {
            return Err(ApiError::bad_request(
                "A shop name, latitude and longitude are required",
            ));
        };
        let location = NewLocation {
            latitude,
            longitude,
            address: request.address,
        };
        validate_location(&location).map_err(ApiError::BadRequest)?;

        let shop = self.require_by_name(name.trim()).await?;
        info!("Adding location to shop {}", shop.name);
        self.store.insert_location(shop.id, location).await?;

        self.find_by_id(shop.id).await
    }

    /// Rename a shop; `name` is the only field that may change
    pub async fn update(&self, name: Option<String>, updates: ShopUpdates) -> ApiResult<Shop> {
        let current = shop_name(name)?;

        if !updates.unknown.is_empty() {
            warn!(
                "Rejected update of shop {} with keys {:?}",
                current,
                rejected_keys(&updates.unknown)
            );
            return Err(ApiError::bad_request(UPDATE_NOT_PERMITTED));
        }
        let new_name = updates
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::bad_request(UPDATE_NOT_PERMITTED))?;

        let shop = self.require_by_name(&current).await?;
        if shop.name == new_name {
            return Ok(shop);
        }
        if self.store.find_shop_by_name(&new_name).await?.is_some() {
            return Err(shop_exists(&new_name));
        }

        info!("Renaming shop {} to {}", shop.name, new_name);
        self.store
            .rename_shop(shop.id, &new_name)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => shop_exists(&new_name),
                other => other.into(),
            })?
            .ok_or_else(|| ApiError::not_found(SHOP_NOT_FOUND))
    }

    /// Delete a shop together with its locations and receipts
    pub async fn delete(&self, name: Option<String>) -> ApiResult<Shop> {
        let shop = self.require_by_name(&shop_name(name)?).await?;

        info!("Deleting shop {} and its receipts", shop.name);
        self.store
            .delete_shop_cascade(shop.id)
            .await?
            .ok_or_else(|| ApiError::not_found(SHOP_NOT_FOUND))
    }

    pub async fn update_location(&self, id: Uuid, updates: LocationUpdates) -> ApiResult<Location> {
        if !updates.unknown.is_empty() {
            warn!(
                "Rejected update of location {} with keys {:?}",
                id,
                rejected_keys(&updates.unknown)
            );
            return Err(ApiError::bad_request(UPDATE_NOT_PERMITTED));
        }
        if let Some(latitude) = updates.latitude {
            validate_latitude(latitude).map_err(ApiError::BadRequest)?;
        }
        if let Some(longitude) = updates.longitude {
            validate_longitude(longitude).map_err(ApiError::BadRequest)?;
        }

        let changes = LocationChanges {
            latitude: updates.latitude,
            longitude: updates.longitude,
            address: updates.address,
        };
        self.store
            .update_location(id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found(LOCATION_NOT_FOUND))
    }

    /// Unlink a location from its shop and delete it
    pub async fn delete_location(&self, id: Uuid) -> ApiResult<Location> {
        let location = self
            .store
            .delete_location(id)
            .await?
            .ok_or_else(|| ApiError::not_found(LOCATION_NOT_FOUND))?;

        info!("Deleted location {} of shop {}", location.id, location.shop);
        Ok(location)
    }

    /// Pull a product from the shop's product index; receipts are kept
    pub async fn remove_product(&self, query: ShopProductQuery) -> ApiResult<Shop> {
        let (Some(name), Some(barcode)) = (query.name, query.barcode) else {
            return Err(ApiError::bad_request(
                "A shop name and a barcode need to be provided",
            ));
        };

        let shop = self.require_by_name(&name).await?;
        let product = self
            .store
            .find_product_by_barcode(&barcode)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))?;

        info!("Removing product {} from shop {}", barcode, shop.name);
        self.store
            .pull_shop_product(shop.id, product.id)
            .await?
            .ok_or_else(|| ApiError::not_found(SHOP_NOT_FOUND))
    }
}
