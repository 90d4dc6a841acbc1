use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, multipart::Field},
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::foods::{CreateFoodRequest, FoodList, UpdateFoodRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Extra, FoodItem},
    response::{ApiResponse, Created},
    routes::params::FoodQuery,
    services::food_service,
    state::AppState,
    uploads::UploadedImage,
};

/// Multipart body accepted by `POST /api/foods`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFoodForm {
    pub name: String,
    pub description: Option<String>,
    /// Minor units.
    pub price: i64,
    #[serde(rename = "type")]
    pub food_type: String,
    /// JSON array of `{id, name, price}`.
    pub extras: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

/// Multipart body accepted by `POST /api/foods/{id}/image`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ImageForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_foods).post(create_food))
        .route("/{id}", get(get_food).put(update_food).delete(delete_food))
        .route("/{id}/image", post(replace_image))
}

#[utoipa::path(
    get,
    path = "/api/foods",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("type" = Option<String>, Query, description = "Filter by category"),
        ("q" = Option<String>, Query, description = "Search name and description"),
        ("min_price" = Option<i64>, Query, description = "Minimum price in minor units"),
        ("max_price" = Option<i64>, Query, description = "Maximum price in minor units"),
        ("sort_by" = Option<String>, Query, description = "Sort by: created_at, price, name"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List foods", body = ApiResponse<FoodList>)
    ),
    tag = "Foods"
)]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodQuery>,
) -> AppResult<Json<ApiResponse<FoodList>>> {
    let resp = food_service::list_foods(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/foods/{id}",
    params(("id" = Uuid, Path, description = "Food ID")),
    responses(
        (status = 200, description = "Food found", body = ApiResponse<FoodItem>),
        (status = 404, description = "Not Found")
    ),
    tag = "Foods"
)]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let resp = food_service::get_food(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/foods",
    request_body(content = CreateFoodForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Food created", body = ApiResponse<FoodItem>),
        (status = 400, description = "Invalid input or image"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Foods"
)]
pub async fn create_food(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Created<FoodItem>> {
    let (payload, image) = read_food_form(multipart).await?;
    let resp = food_service::create_food(&state, &user, payload, image).await?;
    Ok(Created(resp))
}

#[utoipa::path(
    put,
    path = "/api/foods/{id}",
    params(("id" = Uuid, Path, description = "Food ID")),
    request_body = UpdateFoodRequest,
    responses(
        (status = 200, description = "Food updated", body = ApiResponse<FoodItem>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Foods"
)]
pub async fn update_food(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFoodRequest>,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let resp = food_service::update_food(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/foods/{id}/image",
    params(("id" = Uuid, Path, description = "Food ID")),
    request_body(content = ImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image replaced", body = ApiResponse<FoodItem>),
        (status = 400, description = "Missing or invalid image"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Foods"
)]
pub async fn replace_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<FoodItem>>> {
    let mut image = None;
    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("image") {
            image = Some(read_image(field).await?);
        }
    }
    let image = image.ok_or_else(|| AppError::BadRequest("image is required".into()))?;

    let resp = food_service::replace_image(&state, &user, id, image).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/foods/{id}",
    params(("id" = Uuid, Path, description = "Food ID")),
    responses(
        (status = 200, description = "Food deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Foods"
)]
pub async fn delete_food(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = food_service::delete_food(&state, &user, id).await?;
    Ok(Json(resp))
}

async fn next_field(multipart: &mut Multipart) -> AppResult<Option<Field<'_>>> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form field: {e}")))
}

async fn read_image(field: Field<'_>) -> AppResult<UploadedImage> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_ascii_lowercase();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid image upload: {e}")))?;
    Ok(UploadedImage {
        content_type,
        bytes: bytes.to_vec(),
    })
}

async fn read_food_form(
    mut multipart: Multipart,
) -> AppResult<(CreateFoodRequest, Option<UploadedImage>)> {
    let mut name = None;
    let mut description = None;
    let mut price = None;
    let mut food_type = None;
    let mut extras = None;
    let mut image = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let key = field.name().unwrap_or_default().to_string();
        match key.as_str() {
            "name" => name = Some(read_text(field).await?),
            "description" => description = Some(read_text(field).await?),
            "price" => price = Some(read_text(field).await?),
            "type" => food_type = Some(read_text(field).await?),
            "extras" => extras = Some(read_text(field).await?),
            "image" => {
                let upload = read_image(field).await?;
                // Browsers send an empty part when no file is picked.
                if !upload.bytes.is_empty() {
                    image = Some(upload);
                }
            }
            other => tracing::debug!(field = %other, "ignoring unknown form field"),
        }
    }

    let payload = food_request_from_fields(name, description, price, food_type, extras)?;
    Ok((payload, image))
}

fn food_request_from_fields(
    name: Option<String>,
    description: Option<String>,
    price: Option<String>,
    food_type: Option<String>,
    extras: Option<String>,
) -> AppResult<CreateFoodRequest> {
    let name = name.ok_or_else(|| AppError::BadRequest("name is required".into()))?;
    let food_type = food_type.ok_or_else(|| AppError::BadRequest("type is required".into()))?;
    let price = price
        .ok_or_else(|| AppError::BadRequest("price is required".into()))?
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest("price must be an integer amount".into()))?;
    let extras = match extras.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(raw) => serde_json::from_str::<Vec<Extra>>(raw)
            .map_err(|e| AppError::BadRequest(format!("extras must be a JSON array: {e}")))?,
        None => Vec::new(),
    };

    Ok(CreateFoodRequest {
        name,
        description: description.filter(|d| !d.trim().is_empty()),
        price,
        food_type,
        extras,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_fields_build_a_food_request() {
        let req = food_request_from_fields(
            Some("Burger".into()),
            Some("".into()),
            Some(" 9000 ".into()),
            Some("burgers".into()),
            Some(r#"[{"id":"cheese","name":"Extra Cheese","price":1000}]"#.into()),
        )
        .unwrap();
        assert_eq!(req.name, "Burger");
        assert_eq!(req.description, None);
        assert_eq!(req.price, 9000);
        assert_eq!(req.food_type, "burgers");
        assert_eq!(req.extras.len(), 1);
        assert_eq!(req.extras[0].price, 1000);
    }

    #[test]
    fn missing_or_malformed_fields_are_rejected() {
        let missing_price =
            food_request_from_fields(Some("Fries".into()), None, None, Some("sides".into()), None);
        assert!(matches!(missing_price, Err(AppError::BadRequest(_))));

        let bad_price = food_request_from_fields(
            Some("Fries".into()),
            None,
            Some("40.00".into()),
            Some("sides".into()),
            None,
        );
        assert!(matches!(bad_price, Err(AppError::BadRequest(_))));

        let bad_extras = food_request_from_fields(
            Some("Fries".into()),
            None,
            Some("4000".into()),
            Some("sides".into()),
            Some("cheese".into()),
        );
        assert!(matches!(bad_extras, Err(AppError::BadRequest(_))));
    }
}
