use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest},
    error::AppResult,
    response::{ApiResponse, Created},
    services::auth_service::{login_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input or email already taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Created<AuthResponse>> {
    let resp = register_user(&state, payload).await?;
    Ok(Created(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let resp = login_user(&state, payload).await?;
    Ok(Json(resp))
}
