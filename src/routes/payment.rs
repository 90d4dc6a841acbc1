use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::payment::{CreatePaymentIntentRequest, PaymentIntentResponse, WebhookAck},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/webhook", post(webhook))
}

#[utoipa::path(
    post,
    path = "/api/payment/create-payment-intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent for the current cart total", body = ApiResponse<PaymentIntentResponse>),
        (status = 400, description = "Empty cart or invalid currency"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Payment provider error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Option<Json<CreatePaymentIntentRequest>>,
) -> AppResult<Json<ApiResponse<PaymentIntentResponse>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let resp = payment_service::create_payment_intent(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payment/webhook",
    request_body(content = String, description = "Raw provider event", content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "t=<unix>,v1=<hex hmac>")
    ),
    responses(
        (status = 200, description = "Event acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Bad signature or payload"),
    ),
    tag = "Payment"
)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());
    let resp = payment_service::handle_webhook(&state, signature, &body).await?;
    Ok(Json(resp))
}
