//! Payment provider client.
//!
//! The provider speaks the Stripe REST dialect: form-encoded requests
//! authenticated with a bearer secret key, and webhooks signed with
//! HMAC-SHA256 in a `Stripe-Signature` header.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AppError, AppResult};

/// Maximum accepted age of a webhook signature.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct PaymentIntentParams {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(&self, params: &PaymentIntentParams) -> AppResult<PaymentIntent>;
}

pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeGateway {
    pub fn new(api_base: impl Into<String>, secret_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
    code: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(&self, params: &PaymentIntentParams) -> AppResult<PaymentIntent> {
        let secret = self
            .secret_key
            .as_deref()
            .ok_or_else(|| AppError::Payment("payment provider not configured".into()))?;

        let mut form = vec![
            ("amount".to_string(), params.amount.to_string()),
            ("currency".to_string(), params.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        for (key, value) in &params.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(secret)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.json::<ProviderErrorBody>().await {
                Ok(body) => format!(
                    "{}: {}",
                    body.error.code.unwrap_or_else(|| status.to_string()),
                    body.error.message.unwrap_or_default()
                ),
                Err(_) => status.to_string(),
            };
            return Err(AppError::Payment(detail));
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| AppError::Payment(e.to_string()))
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let mac = webhook_mac(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn webhook_mac(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    Ok(mac)
}

/// Check a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>…]`).
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
) -> AppResult<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::BadRequest("Missing webhook timestamp".into()))?;
    if signatures.is_empty() {
        return Err(AppError::BadRequest("Missing webhook signature".into()));
    }
    let within_tolerance = now
        .checked_sub(timestamp)
        .map(i64::unsigned_abs)
        .is_some_and(|age| age <= WEBHOOK_TOLERANCE_SECS.unsigned_abs());
    if !within_tolerance {
        return Err(AppError::BadRequest(
            "Webhook timestamp outside tolerance".into(),
        ));
    }

    let matched = signatures.iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        webhook_mac(secret, timestamp, payload)
            .map(|mac| mac.verify_slice(&expected).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid webhook signature".into()))
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}
