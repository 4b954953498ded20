//! Product and nutrients models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Front-of-pack nutritional grade; the empty string means ungraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NutriScore {
    A,
    B,
    C,
    D,
    E,
    #[default]
    #[serde(rename = "")]
    Ungraded,
}

impl NutriScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutriScore::A => "A",
            NutriScore::B => "B",
            NutriScore::C => "C",
            NutriScore::D => "D",
            NutriScore::E => "E",
            NutriScore::Ungraded => "",
        }
    }
}

impl fmt::Display for NutriScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NutriScore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(NutriScore::A),
            "B" => Ok(NutriScore::B),
            "C" => Ok(NutriScore::C),
            "D" => Ok(NutriScore::D),
            "E" => Ok(NutriScore::E),
            "" => Ok(NutriScore::Ungraded),
            other => Err(format!("`{}` is not a valid nutri-score", other)),
        }
    }
}

/// Nutritional values per 100g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientValues {
    pub energy: f64,
    pub total_fat: f64,
    pub saturated_fat: f64,
    pub total_carbohydrates: f64,
    pub total_sugars: f64,
    pub protein: f64,
    #[serde(default)]
    pub trans_fat: Option<f64>,
    #[serde(default)]
    pub added_sugars: Option<f64>,
    #[serde(default)]
    pub salt: Option<f64>,
    #[serde(default)]
    pub sodium: Option<f64>,
    #[serde(default)]
    pub fibre: Option<f64>,
    #[serde(default)]
    pub per_fruit_veg: Option<f64>,
    #[serde(default)]
    pub cholesterol: Option<f64>,
    #[serde(default)]
    pub d_vitamin: Option<f64>,
    #[serde(default)]
    pub calcium: Option<f64>,
    #[serde(default)]
    pub iron: Option<f64>,
    #[serde(default)]
    pub potassium: Option<f64>,
}

impl NutrientValues {
    /// All provided values, required ones first
    pub fn provided(&self) -> impl Iterator<Item = f64> + '_ {
        [
            Some(self.energy),
            Some(self.total_fat),
            Some(self.saturated_fat),
            Some(self.total_carbohydrates),
            Some(self.total_sugars),
            Some(self.protein),
            self.trans_fat,
            self.added_sugars,
            self.salt,
            self.sodium,
            self.fibre,
            self.per_fruit_veg,
            self.cholesterol,
            self.d_vitamin,
            self.calcium,
            self.iron,
            self.potassium,
        ]
        .into_iter()
        .flatten()
    }

    /// Overwrite every field present in the patch
    pub fn apply(&mut self, patch: &NutrientsPatch) {
        fn set(target: &mut f64, value: Option<f64>) {
            if let Some(v) = value {
                *target = v;
            }
        }
        fn set_opt(target: &mut Option<f64>, value: Option<f64>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut self.energy, patch.energy);
        set(&mut self.total_fat, patch.total_fat);
        set(&mut self.saturated_fat, patch.saturated_fat);
        set(&mut self.total_carbohydrates, patch.total_carbohydrates);
        set(&mut self.total_sugars, patch.total_sugars);
        set(&mut self.protein, patch.protein);
        set_opt(&mut self.trans_fat, patch.trans_fat);
        set_opt(&mut self.added_sugars, patch.added_sugars);
        set_opt(&mut self.salt, patch.salt);
        set_opt(&mut self.sodium, patch.sodium);
        set_opt(&mut self.fibre, patch.fibre);
        set_opt(&mut self.per_fruit_veg, patch.per_fruit_veg);
        set_opt(&mut self.cholesterol, patch.cholesterol);
        set_opt(&mut self.d_vitamin, patch.d_vitamin);
        set_opt(&mut self.calcium, patch.calcium);
        set_opt(&mut self.iron, patch.iron);
        set_opt(&mut self.potassium, patch.potassium);
    }
}

/// Nutrients entity, owned one-to-one by a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub id: Uuid,
    pub product: Uuid,
    #[serde(flatten)]
    pub values: NutrientValues,
}

/// Partial nutrients update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NutrientsPatch {
    pub energy: Option<f64>,
    pub total_fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub total_carbohydrates: Option<f64>,
    pub total_sugars: Option<f64>,
    pub protein: Option<f64>,
    pub trans_fat: Option<f64>,
    pub added_sugars: Option<f64>,
    pub salt: Option<f64>,
    pub sodium: Option<f64>,
    pub fibre: Option<f64>,
    pub per_fruit_veg: Option<f64>,
    pub cholesterol: Option<f64>,
    pub d_vitamin: Option<f64>,
    pub calcium: Option<f64>,
    pub iron: Option<f64>,
    pub potassium: Option<f64>,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub ingredients: Vec<String>,
    pub nutrients: Uuid,
    pub beverage: bool,
    pub nutri_score: NutriScore,
}

/// New product creation payload, validated
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub ingredients: Vec<String>,
    pub nutrients: NutrientValues,
    pub beverage: bool,
    pub nutri_score: NutriScore,
}

/// Product update payload, validated
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub nutrients: Option<NutrientsPatch>,
    pub beverage: Option<bool>,
    pub nutri_score: Option<NutriScore>,
}

/// Request for product creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub barcode: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub nutrients: Option<NutrientValues>,
    pub beverage: Option<bool>,
    #[serde(default)]
    pub nutri_score: NutriScore,
}

/// Fields an administrator may change on a product
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdates {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub nutrients: Option<NutrientsPatch>,
    pub beverage: Option<bool>,
    pub nutri_score: Option<NutriScore>,
    #[serde(flatten)]
    pub unknown: Map<String, Value>,
}

/// `?barcode=` query
#[derive(Debug, Deserialize)]
pub struct BarcodeQuery {
    pub barcode: Option<String>,
}

/// Product with its nutrients document populated
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub ingredients: Vec<String>,
    pub nutrients: Option<Nutrients>,
    pub beverage: bool,
    pub nutri_score: NutriScore,
}

impl ProductResponse {
    pub fn new(product: Product, nutrients: Option<Nutrients>) -> Self {
        Self {
            id: product.id,
            barcode: product.barcode,
            name: product.name,
            brand: product.brand,
            image: product.image,
            ingredients: product.ingredients,
            nutrients,
            beverage: product.beverage,
            nutri_score: product.nutri_score,
        }
    }
}
