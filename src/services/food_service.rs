use std::path::Path;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::foods::{CreateFoodRequest, FoodList, UpdateFoodRequest},
    entity::food_items::{ActiveModel, Column, Entity as FoodItems, Model as FoodModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{FoodItem, to_json},
    pricing::validate_extra_definitions,
    response::{ApiResponse, Meta},
    routes::params::{FoodQuery, FoodSortBy, SortOrder},
    services::required_text,
    state::AppState,
    uploads::{self, UploadedImage},
};

pub async fn list_foods(state: &AppState, query: FoodQuery) -> AppResult<ApiResponse<FoodList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(food_type) = query
        .food_type
        .as_deref()
        .map(normalize_food_type)
        .filter(|s| !s.is_empty())
    {
        condition = condition.add(Column::FoodType.eq(food_type));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(FoodSortBy::CreatedAt) {
        FoodSortBy::CreatedAt => Column::CreatedAt,
        FoodSortBy::Price => Column::Price,
        FoodSortBy::Name => Column::Name,
    };

    let mut finder = FoodItems::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(FoodItem::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Foods", FoodList { items }, Some(meta)))
}

pub(crate) async fn find_food(state: &AppState, id: Uuid) -> AppResult<FoodModel> {
    FoodItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_food(state: &AppState, id: Uuid) -> AppResult<ApiResponse<FoodItem>> {
    let food = find_food(state, id).await?;
    Ok(ApiResponse::ok("Food", food.try_into()?))
}

pub async fn create_food(
    state: &AppState,
    user: &AuthUser,
    payload: CreateFoodRequest,
    image: Option<UploadedImage>,
) -> AppResult<ApiResponse<FoodItem>> {
    ensure_admin(user)?;
    payload.validate()?;
    validate_extra_definitions(&payload.extras)?;
    let name = required_text("name", &payload.name)?;
    let food_type = required_text("food_type", &normalize_food_type(&payload.food_type))?;
    let extras = to_json(&payload.extras)?;

    let image_path = match image {
        Some(image) => Some(store_image(state, image).await?),
        None => None,
    };

    let upload_dir = Path::new(&state.config.upload_dir);
    let inserted = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        image: Set(image_path.clone()),
        food_type: Set(food_type),
        extras: Set(extras),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await;
    let food = uploads::discard_on_error(upload_dir, image_path.as_deref(), inserted).await?;

    tracing::info!(food_id = %food.id, admin_id = %user.user_id, "food created");
    Ok(ApiResponse::ok("Food created", food.try_into()?))
}

pub async fn update_food(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateFoodRequest,
) -> AppResult<ApiResponse<FoodItem>> {
    ensure_admin(user)?;
    payload.validate()?;
    if let Some(extras) = payload.extras.as_ref() {
        validate_extra_definitions(extras)?;
    }

    let existing = find_food(state, id).await?;
    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(required_text("name", &name)?);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(food_type) = payload.food_type {
        active.food_type = Set(required_text("food_type", &normalize_food_type(&food_type))?);
    }
    if let Some(extras) = payload.extras {
        active.extras = Set(to_json(&extras)?);
    }
    active.updated_at = Set(Utc::now().into());
    let food = active.update(&state.orm).await?;

    tracing::info!(food_id = %food.id, admin_id = %user.user_id, "food updated");
    Ok(ApiResponse::ok("Food updated", food.try_into()?))
}

pub async fn replace_image(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    image: UploadedImage,
) -> AppResult<ApiResponse<FoodItem>> {
    ensure_admin(user)?;
    let existing = find_food(state, id).await?;
    let previous = existing.image.clone();

    let image_path = store_image(state, image).await?;
    let mut active: ActiveModel = existing.into();
    active.image = Set(Some(image_path.clone()));
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await;
    let food = uploads::discard_on_error(
        Path::new(&state.config.upload_dir),
        Some(&image_path),
        updated,
    )
    .await?;

    if let Some(previous) = previous {
        uploads::remove_image(Path::new(&state.config.upload_dir), &previous).await;
    }

    Ok(ApiResponse::ok("Image updated", food.try_into()?))
}

pub async fn delete_food(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = find_food(state, id).await?;

    let result = FoodItems::delete_by_id(existing.id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Some(image) = existing.image.as_deref() {
        uploads::remove_image(Path::new(&state.config.upload_dir), image).await;
    }

    tracing::info!(food_id = %id, admin_id = %user.user_id, "food deleted");
    Ok(ApiResponse::ok("Food deleted", serde_json::json!({ "id": id })))
}

async fn store_image(state: &AppState, image: UploadedImage) -> AppResult<String> {
    uploads::store_image(
        Path::new(&state.config.upload_dir),
        image,
        state.config.max_upload_bytes,
    )
    .await
}

/// Categories are stored and matched lowercased.
fn normalize_food_type(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::normalize_food_type;

    #[test]
    fn food_types_match_regardless_of_case() {
        assert_eq!(normalize_food_type(" Burgers "), "burgers");
        assert_eq!(normalize_food_type("burgers"), normalize_food_type("BURGERS"));
    }
}
