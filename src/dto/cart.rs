use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CartItem, FoodItem};

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddToCartRequest {
    pub food_id: Uuid,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
    /// Ids of the food's extras to add.
    #[serde(default)]
    pub selected_extras: Vec<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, max = 99))]
    pub quantity: Option<i32>,
    pub selected_extras: Option<Vec<String>>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub food: Option<FoodItem>,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    /// Total of the whole cart, not just this page.
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearCartResponse {
    pub removed: u64,
}
