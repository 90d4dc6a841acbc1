use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{cart_items, food_items, orders, users},
    error::AppError,
};

/// Public view of a user. The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub card_details: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An optional add-on for a food item. `price` is the delta in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Extra {
    pub id: String,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub food_type: String,
    pub extras: Vec<Extra>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub selected_extras: Vec<Extra>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order snapshot, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub food_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub selected_extras: Vec<Extra>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<OrderLine>,
    pub total_price: i64,
    pub delivery_address: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cash,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cash => "cash",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "cash" => Ok(PaymentStatus::Cash),
            other => Err(AppError::BadRequest(format!("Invalid payment status {other}"))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Preparing,
    Collected,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Collected => "collected",
            OrderStatus::OnTheWay => "on_the_way",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Delivered and cancelled orders are closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, AppError> {
        if self.is_terminal() && self != next {
            return Err(AppError::BadRequest(format!(
                "Order is already {} and cannot become {}",
                self, next
            )));
        }
        Ok(next)
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(OrderStatus::Processing),
            "preparing" => Ok(OrderStatus::Preparing),
            "collected" => Ok(OrderStatus::Collected),
            "on_the_way" => Ok(OrderStatus::OnTheWay),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::BadRequest(format!("Invalid order status {other}"))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn from_json<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt {column} column: {e}")))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            surname: model.surname,
            email: model.email,
            contact_number: model.contact_number,
            address: model.address,
            card_details: model.card_details,
            is_admin: model.is_admin,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl TryFrom<food_items::Model> for FoodItem {
    type Error = AppError;

    fn try_from(model: food_items::Model) -> Result<Self, Self::Error> {
        Ok(FoodItem {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image: model.image,
            food_type: model.food_type,
            extras: from_json(model.extras, "food_items.extras")?,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<cart_items::Model> for CartItem {
    type Error = AppError;

    fn try_from(model: cart_items::Model) -> Result<Self, Self::Error> {
        Ok(CartItem {
            id: model.id,
            user_id: model.user_id,
            food_id: model.food_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            selected_extras: from_json(model.selected_extras, "cart_items.selected_extras")?,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<orders::Model> for Order {
    type Error = AppError;

    fn try_from(model: orders::Model) -> Result<Self, Self::Error> {
        Ok(Order {
            id: model.id,
            user_id: model.user_id,
            items: from_json(model.items, "orders.items")?,
            total_price: model.total_price,
            delivery_address: model.delivery_address,
            payment_status: model.payment_status.parse()?,
            order_status: model.order_status.parse()?,
            payment_intent_id: model.payment_intent_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_through_its_wire_name() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Preparing,
            OrderStatus::Collected,
            OrderStatus::OnTheWay,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::json!(status.as_str()));
        }
    }

    #[test]
    fn unknown_statuses_are_rejected() {
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn closed_orders_cannot_move() {
        assert!(
            OrderStatus::Delivered
                .transition_to(OrderStatus::Processing)
                .is_err()
        );
        assert!(
            OrderStatus::Cancelled
                .transition_to(OrderStatus::Delivered)
                .is_err()
        );
        assert_eq!(
            OrderStatus::Processing
                .transition_to(OrderStatus::OnTheWay)
                .unwrap(),
            OrderStatus::OnTheWay
        );
    }

    #[test]
    fn food_type_is_serialized_as_type() {
        let food = FoodItem {
            id: Uuid::nil(),
            name: "Burger".into(),
            description: None,
            price: 9000,
            image: None,
            food_type: "burgers".into(),
            extras: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&food).unwrap();
        assert_eq!(json["type"], "burgers");
        assert!(json.get("food_type").is_none());
    }
}
