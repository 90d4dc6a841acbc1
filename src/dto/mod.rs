pub mod admin;
pub mod auth;
pub mod cart;
pub mod foods;
pub mod orders;
pub mod payment;
pub mod users;
