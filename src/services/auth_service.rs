use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::auth::{AuthResponse, LoginRequest, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::issue_token,
    response::{ApiResponse, Meta},
    services::required_text,
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// A registration racing another one for the same address loses on the
// unique index rather than on the lookup above.
fn email_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest("Email is already taken".to_string())
        }
        _ => err.into(),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    payload.validate()?;
    let name = required_text("name", &payload.name)?;
    let email = normalize_email(&payload.email);

    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        surname: Set(payload.surname),
        email: Set(email),
        password_hash: Set(password_hash),
        contact_number: Set(payload.contact_number),
        address: Set(payload.address),
        card_details: Set(None),
        is_admin: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(email_conflict)?;

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        user.role(),
        state.config.jwt_expiry_hours,
    )?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::success(
        "User registered",
        AuthResponse {
            token,
            user: user.into(),
        },
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    payload.validate()?;
    let LoginRequest { email, password } = payload;

    let user = Users::find()
        .filter(UserCol::Email.eq(normalize_email(&email)))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = issue_token(
        &state.config.jwt_secret,
        user.id,
        user.role(),
        state.config.jwt_expiry_hours,
    )?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::success(
        "Logged in",
        AuthResponse {
            token,
            user: user.into(),
        },
        Some(Meta::empty()),
    ))
}
