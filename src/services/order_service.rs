use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        food_items::{Column as FoodCol, Entity as FoodItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Order, OrderLine, OrderStatus, PaymentStatus, to_json},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Turn the caller's cart into an order and empty the cart, in one
/// transaction.
///
/// Cart rows are read `FOR UPDATE`, so a second checkout racing this one
/// waits for the commit and then finds the cart empty.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    payload.validate()?;
    let delivery_address = payload.delivery_address.trim().to_string();
    if delivery_address.is_empty() {
        return Err(AppError::BadRequest("delivery_address is required".into()));
    }

    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(CartItem::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let total_price = pricing::cart_total(cart.iter().map(|i| (i.quantity, i.unit_price)))?;
    if let Some(expected) = payload.total_price {
        if expected != total_price {
            return Err(AppError::BadRequest(format!(
                "Cart total changed: expected {expected}, current {total_price}"
            )));
        }
    }

    let food_ids: Vec<Uuid> = cart.iter().map(|i| i.food_id).collect();
    let names: HashMap<Uuid, String> = FoodItems::find()
        .select_only()
        .column(FoodCol::Id)
        .column(FoodCol::Name)
        .filter(FoodCol::Id.is_in(food_ids))
        .into_tuple::<(Uuid, String)>()
        .all(&txn)
        .await?
        .into_iter()
        .collect();

    let lines = snapshot_lines(cart, &names);
    let item_count = lines.len();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        items: Set(to_json(&lines)?),
        total_price: Set(total_price),
        delivery_address: Set(delivery_address),
        payment_status: Set(payload
            .payment_status
            .unwrap_or(PaymentStatus::Pending)
            .as_str()
            .to_string()),
        order_status: Set(OrderStatus::Processing.as_str().to_string()),
        payment_intent_id: Set(payload.payment_intent_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    // clear cart
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total_price,
        items = item_count,
        "order placed"
    );

    Ok(ApiResponse::ok("Order placed", order.try_into()?))
}

fn snapshot_lines(cart: Vec<CartItem>, names: &HashMap<Uuid, String>) -> Vec<OrderLine> {
    cart.into_iter()
        .map(|item| OrderLine {
            food_id: item.food_id,
            name: names.get(&item.food_id).cloned().unwrap_or_default(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            selected_extras: item.selected_extras,
            notes: item.notes,
        })
        .collect()
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(OrderCol::OrderStatus.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::ok("OK", order.try_into()?))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::Extra;

    fn line(food_id: Uuid, quantity: i32, unit_price: i64) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            food_id,
            quantity,
            unit_price,
            selected_extras: vec![],
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn snapshot_keeps_quantities_prices_and_names() {
        let burger = Uuid::new_v4();
        let fries = Uuid::new_v4();
        let mut first = line(burger, 2, 9000);
        first.selected_extras = vec![Extra {
            id: "cheese".into(),
            name: "Extra Cheese".into(),
            price: 0,
        }];
        first.notes = Some("no onions".into());
        let names = HashMap::from([
            (burger, "Burger".to_string()),
            (fries, "Fries".to_string()),
        ]);

        let lines = snapshot_lines(vec![first, line(fries, 1, 4000)], &names);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Burger");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].selected_extras.len(), 1);
        assert_eq!(lines[0].notes.as_deref(), Some("no onions"));
        assert_eq!(lines[1].name, "Fries");
        let total = pricing::cart_total(lines.iter().map(|l| (l.quantity, l.unit_price))).unwrap();
        assert_eq!(total, 22000);
    }
}
