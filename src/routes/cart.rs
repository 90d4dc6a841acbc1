use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, ClearCartResponse, UpdateCartItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Created},
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart).delete(clear_cart))
        .route("/{id}", put(update_cart_item).delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Cart lines for the current user with the cart total", body = ApiResponse<CartView>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::list_cart(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Cart line created", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity or extras"),
        (status = 404, description = "Food not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Created<CartItem>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Created(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/{id}",
    params(("id" = Uuid, Path, description = "Cart line ID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Cart line updated", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::update_cart_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{id}",
    params(("id" = Uuid, Path, description = "Cart line ID")),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = cart_service::remove_cart_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<ClearCartResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ClearCartResponse>>> {
    let resp = cart_service::clear_cart(&state, &user).await?;
    Ok(Json(resp))
}
