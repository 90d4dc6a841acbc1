use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Order, PaymentStatus};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 500))]
    pub delivery_address: String,
    pub payment_status: Option<PaymentStatus>,
    /// Total the client displayed; rejected when it no longer matches the cart.
    pub total_price: Option<i64>,
    #[validate(length(min = 1, max = 255))]
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub order_status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminOrder {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<OrderCustomer>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AdminOrderList {
    #[schema(value_type = Vec<AdminOrder>)]
    pub items: Vec<AdminOrder>,
}
