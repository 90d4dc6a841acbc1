use crate::error::{AppError, AppResult};

pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod food_service;
pub mod order_service;
pub mod payment_service;
pub mod user_service;

/// Trimmed value of a required text field; whitespace alone is rejected.
pub(crate) fn required_text(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}
