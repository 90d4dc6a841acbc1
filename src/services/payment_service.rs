use chrono::Utc;
use validator::Validate;

use crate::{
    dto::payment::{CreatePaymentIntentRequest, PaymentIntentResponse, WebhookAck},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    payment::{PaymentIntentParams, WebhookEvent, verify_webhook_signature},
    response::ApiResponse,
    services::cart_service::cart_amount,
    state::AppState,
};

pub async fn create_payment_intent(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentIntentRequest,
) -> AppResult<ApiResponse<PaymentIntentResponse>> {
    payload.validate()?;
    let currency = resolve_currency(payload.currency.as_deref(), &state.config.default_currency)?;

    let amount = cart_amount(&state.orm, user.user_id).await?;
    if amount <= 0 {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let params = PaymentIntentParams {
        amount,
        currency,
        metadata: vec![("user_id".to_string(), user.user_id.to_string())],
    };
    let intent = state.payments.create_payment_intent(&params).await?;

    tracing::info!(
        user_id = %user.user_id,
        payment_intent_id = %intent.id,
        amount,
        "payment intent created"
    );

    Ok(ApiResponse::ok(
        "Payment intent created",
        PaymentIntentResponse {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
        },
    ))
}

fn resolve_currency(requested: Option<&str>, default: &str) -> AppResult<String> {
    let currency = requested
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(default)
        .to_ascii_lowercase();
    if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(AppError::BadRequest(format!("Invalid currency {currency}")));
    }
    Ok(currency)
}

/// Verify and acknowledge a provider event. Orders are left untouched.
pub async fn handle_webhook(
    state: &AppState,
    signature: Option<&str>,
    body: &[u8],
) -> AppResult<ApiResponse<WebhookAck>> {
    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::Payment("webhook secret not configured".into()))?;
    let signature =
        signature.ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".into()))?;

    verify_webhook_signature(secret, signature, body, Utc::now().timestamp())?;

    let event: WebhookEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;
    let intent_id = event
        .data
        .object
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("-");

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            tracing::info!(event_id = %event.id, payment_intent_id = %intent_id, "payment succeeded")
        }
        "payment_intent.payment_failed" => {
            tracing::warn!(event_id = %event.id, payment_intent_id = %intent_id, "payment failed")
        }
        other => tracing::debug!(event_id = %event.id, event_type = %other, "webhook ignored"),
    }

    Ok(ApiResponse::ok("Webhook received", WebhookAck { received: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_falls_back_to_default_and_is_lowercased() {
        assert_eq!(resolve_currency(None, "zar").unwrap(), "zar");
        assert_eq!(resolve_currency(Some(" "), "zar").unwrap(), "zar");
        assert_eq!(resolve_currency(Some("USD"), "zar").unwrap(), "usd");
    }

    #[test]
    fn malformed_currency_is_rejected() {
        assert!(matches!(
            resolve_currency(Some("U5D"), "zar"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            resolve_currency(Some("euro"), "zar"),
            Err(AppError::BadRequest(_))
        ));
    }
}
