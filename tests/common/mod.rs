#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use restaurant_api::{
    config::AppConfig,
    db::OrmConn,
    error::AppResult,
    payment::{PaymentGateway, PaymentIntent, PaymentIntentParams},
    state::AppState,
};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        jwt_expiry_hours: 1,
        stripe_secret_key: None,
        stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
        stripe_api_base: "http://127.0.0.1:9".into(),
        default_currency: "zar".into(),
        upload_dir: std::env::temp_dir()
            .join("restaurant-api-test-uploads")
            .display()
            .to_string(),
        max_upload_bytes: 1024 * 1024,
    }
}

/// Records every request and answers with a canned intent.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<PaymentIntentParams>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(&self, params: &PaymentIntentParams) -> AppResult<PaymentIntent> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(params.clone());
        let id = format!("pi_test_{}", requests.len());
        Ok(PaymentIntent {
            client_secret: Some(format!("{id}_secret")),
            id,
            amount: params.amount,
            currency: params.currency.clone(),
            status: "requires_payment_method".into(),
        })
    }
}

pub fn test_state(orm: OrmConn, gateway: Arc<FakeGateway>) -> AppState {
    AppState::new(orm, test_config("postgres://unused"), gateway)
}
