use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use validator::Validate;

use crate::{
    dto::users::UpdateProfileRequest,
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::required_text,
    state::AppState,
};

async fn find_user(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let found = find_user(state, user).await?;
    Ok(ApiResponse::ok("Profile", found.into()))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let existing = find_user(state, user).await?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(required_text("name", &name)?);
    }
    if let Some(surname) = payload.surname {
        active.surname = Set(blank_to_none(surname));
    }
    if let Some(contact_number) = payload.contact_number {
        active.contact_number = Set(blank_to_none(contact_number));
    }
    if let Some(address) = payload.address {
        active.address = Set(blank_to_none(address));
    }
    if let Some(card_details) = payload.card_details {
        active.card_details = Set(blank_to_none(card_details));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(user_id = %updated.id, "profile updated");
    Ok(ApiResponse::ok("Profile updated", updated.into()))
}

fn blank_to_none(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
