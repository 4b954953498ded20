//! Product repository: catalogue entries and their nutrients

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateProductRequest, NewProduct, Nutrients, Product, ProductChanges, ProductResponse,
    ProductUpdates, rejected_keys,
};
use crate::store::{Store, StoreError};
use crate::validation::validate_nutrients;

const PRODUCT_NOT_FOUND: &str = "Product not found";

fn barcode_taken(barcode: &str) -> ApiError {
    ApiError::conflict(format!("A product with barcode {} was already found", barcode))
}

fn required(value: Option<String>, message: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

/// Product repository
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn Store>,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn with_nutrients(&self, product: Product) -> ApiResult<ProductResponse> {
        let nutrients = self.store.find_nutrients(product.nutrients).await?;
        Ok(ProductResponse::new(product, nutrients))
    }

    /// Create a product together with its nutrients document
    pub async fn create(&self, request: CreateProductRequest) -> ApiResult<ProductResponse> {
        let barcode = required(request.barcode, "A barcode is required")?;
        let name = required(request.name, "A name is required")?;
        let brand = required(request.brand, "A brand is required")?;
        let image = required(request.image, "An image is required")?;
        let beverage = request
            .beverage
            .ok_or_else(|| ApiError::bad_request("Indicate if it is a beverage"))?;
        let nutrients = request
            .nutrients
            .ok_or_else(|| ApiError::bad_request("Nutrients are required"))?;
        validate_nutrients(&nutrients).map_err(ApiError::BadRequest)?;

        if self.store.find_product_by_barcode(&barcode).await?.is_some() {
            return Err(barcode_taken(&barcode));
        }

        info!("Creating product {} ({})", name, barcode);
        let product = self
            .store
            .insert_product(NewProduct {
                barcode: barcode.clone(),
                name,
                brand,
                image,
                ingredients: request.ingredients,
                nutrients: nutrients.clone(),
                beverage,
                nutri_score: request.nutri_score,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { .. } => barcode_taken(&barcode),
                other => other.into(),
            })?;

        let nutrients = Nutrients {
            id: product.nutrients,
            product: product.id,
            values: nutrients,
        };
        Ok(ProductResponse::new(product, Some(nutrients)))
    }

    pub async fn find_by_barcode(&self, barcode: Option<String>) -> ApiResult<ProductResponse> {
        let barcode = required(barcode, "A barcode needs to be provided")?;
        let product = self
            .store
            .find_product_by_barcode(&barcode)
            .await?
            .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))?;

        self.with_nutrients(product).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<ProductResponse> {
        let product = self
            .store
            .find_product_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))?;

        self.with_nutrients(product).await
    }

    /// Products whose name contains `name`, ignoring case
    pub async fn search(&self, name: Option<String>) -> ApiResult<Vec<ProductResponse>> {
        let fragment = name.filter(|n| !n.is_empty());
        let products = self.store.search_products(fragment.as_deref()).await?;

        let mut found = Vec::with_capacity(products.len());
        for product in products {
            found.push(self.with_nutrients(product).await?);
        }
        Ok(found)
    }

    /// Apply an administrator update; keys outside the allow-list reject the whole request
    pub async fn update(
        &self,
        barcode: Option<String>,
        updates: ProductUpdates,
    ) -> ApiResult<ProductResponse> {
        let barcode = required(barcode, "A barcode needs to be provided")?;

        if !updates.unknown.is_empty() {
            warn!(
                "Rejected update of product {} with keys {:?}",
                barcode,
                rejected_keys(&updates.unknown)
            );
            return Err(ApiError::bad_request("Update is not permitted"));
        }

        for (field, value) in [
            ("name", &updates.name),
            ("brand", &updates.brand),
            ("image", &updates.image),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ApiError::bad_request(format!("The {} cannot be empty", field)));
            }
        }
        if let Some(patch) = &updates.nutrients {
            let invalid = [
                patch.energy,
                patch.total_fat,
                patch.saturated_fat,
                patch.total_carbohydrates,
                patch.total_sugars,
                patch.protein,
                patch.trans_fat,
                patch.added_sugars,
                patch.salt,
                patch.sodium,
                patch.fibre,
                patch.per_fruit_veg,
                patch.cholesterol,
                patch.d_vitamin,
                patch.calcium,
                patch.iron,
                patch.potassium,
            ]
            .into_iter()
            .flatten()
            .any(|v| !v.is_finite() || v < 0.0);

            if invalid {
                return Err(ApiError::bad_request(
                    "Nutrient values must be non-negative numbers",
                ));
            }
        }

        let product = self
            .store
            .find_product_by_barcode(&barcode)
            .await?
            .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))?;

        info!("Updating product {}", barcode);
        let changes = ProductChanges {
            name: updates.name,
            brand: updates.brand,
            image: updates.image,
            ingredients: updates.ingredients,
            nutrients: updates.nutrients,
            beverage: updates.beverage,
            nutri_score: updates.nutri_score,
        };
        let updated = self
            .store
            .update_product(product.id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))?;

        self.with_nutrients(updated).await
    }

    /// Delete a product with its nutrients, receipts and index entries
    pub async fn delete(&self, barcode: Option<String>) -> ApiResult<Product> {
        let barcode = required(barcode, "A barcode needs to be provided")?;

        // lookup first so a missing product aborts before any side effect
        let product = self
            .store
            .find_product_by_barcode(&barcode)
            .await?
            .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))?;

        info!("Deleting product {} and its receipts", barcode);
        self.store
            .delete_product_cascade(product.id)
            .await?
            .ok_or_else(|| ApiError::not_found(PRODUCT_NOT_FOUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn create_request(barcode: &str) -> CreateProductRequest {
        serde_json::from_value(json!({
            "barcode": barcode,
            "name": "Doritos Tex Mex",
            "brand": "Doritos",
            "image": "null",
            "ingredients": ["maiz", "aceite vegetal"],
            "nutrients": {
                "energy": 497,
                "totalFat": 25.8,
                "saturatedFat": 3.1,
                "totalCarbohydrates": 56.9,
                "totalSugars": 2.3,
                "protein": 6.6,
                "salt": 0.97
            },
            "beverage": false,
            "nutriScore": "D"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_conflict() {
        let repo = ProductRepository::new(Arc::new(MemoryStore::new()));

        let created = repo.create(create_request("712345760891")).await.unwrap();
        assert_eq!(created.nutrients.unwrap().values.energy, 497.0);

        let err = repo.create(create_request("712345760891")).await.unwrap_err();
        assert!(
            matches!(err, ApiError::Conflict(msg) if msg == "A product with barcode 712345760891 was already found")
        );
    }

    #[tokio::test]
    async fn test_create_requires_salt_or_sodium() {
        let repo = ProductRepository::new(Arc::new(MemoryStore::new()));
        let mut request = create_request("712345760891");
        if let Some(nutrients) = request.nutrients.as_mut() {
            nutrients.salt = None;
        }

        assert!(matches!(
            repo.create(request).await.unwrap_err(),
            ApiError::BadRequest(_)
        ));
    }

    #[tokio::test]
    async fn test_update_patches_nutrients_and_rejects_barcode() {
        let repo = ProductRepository::new(Arc::new(MemoryStore::new()));
        repo.create(create_request("712345760891")).await.unwrap();

        let forbidden: ProductUpdates =
            serde_json::from_value(json!({"barcode": "1"})).unwrap();
        assert!(matches!(
            repo.update(Some("712345760891".to_string()), forbidden).await.unwrap_err(),
            ApiError::BadRequest(msg) if msg == "Update is not permitted"
        ));

        let updates: ProductUpdates = serde_json::from_value(json!({
            "name": "Doritos Original",
            "nutrients": {"protein": 7.0}
        }))
        .unwrap();
        let updated = repo
            .update(Some("712345760891".to_string()), updates)
            .await
            .unwrap();

        assert_eq!(updated.name, "Doritos Original");
        let nutrients = updated.nutrients.unwrap();
        assert_eq!(nutrients.values.protein, 7.0);
        assert_eq!(nutrients.values.energy, 497.0);
    }

    #[tokio::test]
    async fn test_search_ignores_case() {
        let repo = ProductRepository::new(Arc::new(MemoryStore::new()));
        repo.create(create_request("712345760891")).await.unwrap();

        assert_eq!(repo.search(Some("tex".to_string())).await.unwrap().len(), 1);
        assert_eq!(repo.search(Some("oreo".to_string())).await.unwrap().len(), 0);
        assert_eq!(repo.search(None).await.unwrap().len(), 1);
    }
}
