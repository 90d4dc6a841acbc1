use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Extra, FoodItem};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateFoodRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub price: i64,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 60))]
    pub food_type: String,
    #[serde(default)]
    pub extras: Vec<Extra>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateFoodRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub price: Option<i64>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 60))]
    pub food_type: Option<String>,
    pub extras: Option<Vec<Extra>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FoodList {
    #[schema(value_type = Vec<FoodItem>)]
    pub items: Vec<FoodItem>,
}
