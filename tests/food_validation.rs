mod common;

use std::sync::Arc;

use restaurant_api::{
    dto::foods::CreateFoodRequest,
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN},
    services::food_service,
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{FakeGateway, test_state};

#[tokio::test]
async fn blank_food_names_are_refused_before_anything_is_stored() {
    let state = test_state(
        DatabaseConnection::Disconnected,
        Arc::new(FakeGateway::default()),
    );
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: ROLE_ADMIN.into(),
    };

    let result = food_service::create_food(
        &state,
        &admin,
        CreateFoodRequest {
            name: "   ".into(),
            description: None,
            price: 9000,
            food_type: "burgers".into(),
            extras: vec![],
        },
        None,
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "name must not be empty"));
}
