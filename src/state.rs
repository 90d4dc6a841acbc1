use std::sync::Arc;

use crate::{config::AppConfig, db::OrmConn, payment::PaymentGateway};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig, payments: Arc<dyn PaymentGateway>) -> Self {
        Self {
            orm,
            config: Arc::new(config),
            payments,
        }
    }
}
