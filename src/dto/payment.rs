use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CreatePaymentIntentRequest {
    /// ISO 4217 code; the configured default is used when absent.
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}
