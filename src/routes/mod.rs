use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{StatusCode, Uri},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    response::ApiResponse,
    state::AppState,
    uploads::PUBLIC_PREFIX,
};

pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod foods;
pub mod health;
pub mod orders;
pub mod params;
pub mod payment;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/foods", foods::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/payment", payment::router())
        .nest("/users", users::router())
        .nest("/admin", admin::router())
}

/// Every route the service answers, with state bound. Cross-cutting layers
/// (tracing, request ids, CORS) are added by the binary.
pub fn create_app(state: AppState) -> Router {
    // Multipart uploads need room for the image plus the text fields.
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&state.config.upload_dir))
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::ok("Not Found", serde_json::json!({ "path": uri.path() }));
    (StatusCode::NOT_FOUND, Json(body))
}
