use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::cart::{AddToCartRequest, CartLine, CartView, ClearCartResponse, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        food_items::Entity as FoodItems,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Extra, FoodItem, to_json},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::food_service::find_food,
    state::AppState,
};

/// Total of every line in `user_id`'s cart.
pub(crate) async fn cart_amount<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<i64> {
    let lines = CartItems::find()
        .select_only()
        .column(CartCol::Quantity)
        .column(CartCol::UnitPrice)
        .filter(CartCol::UserId.eq(user_id))
        .into_tuple::<(i32, i64)>()
        .all(conn)
        .await?;
    pricing::cart_total(lines)
}

pub async fn list_cart(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartView>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = CartItems::find().filter(CartCol::UserId.eq(user.user_id));
    let total_lines = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .find_also_related(FoodItems)
        .order_by_desc(CartCol::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (cart, food) in rows {
        let item = CartItem::try_from(cart)?;
        let line_total = pricing::line_total(item.quantity, item.unit_price)?;
        items.push(CartLine {
            item,
            food: food.map(FoodItem::try_from).transpose()?,
            line_total,
        });
    }

    let total = cart_amount(&state.orm, user.user_id).await?;
    let meta = Meta::new(page, limit, total_lines);
    Ok(ApiResponse::success("OK", CartView { items, total }, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;
    let food: FoodItem = find_food(state, payload.food_id).await?.try_into()?;

    let extras = pricing::resolve_extras(&food.extras, &payload.selected_extras)?;
    let unit_price = pricing::unit_price(food.price, &extras)?;

    let item = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        food_id: Set(food.id),
        quantity: Set(payload.quantity),
        unit_price: Set(unit_price),
        selected_extras: Set(to_json(&extras)?),
        notes: Set(clean_notes(payload.notes)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(user_id = %user.user_id, food_id = %food.id, unit_price, "cart line added");
    Ok(ApiResponse::ok("Added to cart", item.try_into()?))
}

async fn find_own_line(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<CartModel> {
    CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(id))
                .add(CartCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;
    let existing = find_own_line(state, user, id).await?;
    let food_id = existing.food_id;
    let mut active: CartActive = existing.into();

    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(clean_notes(Some(notes)));
    }
    // A new extras selection re-prices the line from the current catalog.
    if let Some(selected) = payload.selected_extras {
        let food: FoodItem = find_food(state, food_id).await?.try_into()?;
        let extras: Vec<Extra> = pricing::resolve_extras(&food.extras, &selected)?;
        active.unit_price = Set(pricing::unit_price(food.price, &extras)?);
        active.selected_extras = Set(to_json(&extras)?);
    }
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Cart item updated", item.try_into()?))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(id))
                .add(CartCol::UserId.eq(user.user_id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::ok("Item removed", serde_json::json!({ "id": id })))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ClearCartResponse>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::ok(
        "Cart cleared",
        ClearCartResponse {
            removed: result.rows_affected,
        },
    ))
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}
