use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Sign an HS256 token for `user_id` that expires after `ttl_hours`.
pub fn issue_token(secret: &str, user_id: Uuid, role: &str, ttl_hours: i64) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

    Ok(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        verify_token(&state.config.jwt_secret, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_tokens_verify_back_to_the_same_user() {
        let id = Uuid::new_v4();
        let token = issue_token(SECRET, id, ROLE_ADMIN, 1).unwrap();
        let user = verify_token(SECRET, &token).unwrap();
        assert_eq!(user.user_id, id);
        assert!(user.is_admin());
    }

    #[test]
    fn wrong_secret_or_expired_token_is_unauthorized() {
        let token = issue_token(SECRET, Uuid::new_v4(), ROLE_USER, 1).unwrap();
        assert!(matches!(
            verify_token("another-secret", &token),
            Err(AppError::Unauthorized(_))
        ));

        let expired = issue_token(SECRET, Uuid::new_v4(), ROLE_USER, -2).unwrap();
        assert!(matches!(
            verify_token(SECRET, &expired),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn only_admins_pass_the_admin_check() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: ROLE_USER.into(),
        };
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));

        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            role: ROLE_ADMIN.into(),
        };
        assert!(ensure_admin(&admin).is_ok());
    }
}
