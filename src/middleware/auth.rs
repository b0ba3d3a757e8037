use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{domain::Role, dto::auth::Claims, error::AppError, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Merchants and admins act as store staff.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Merchant | Role::Admin)
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

pub fn ensure_merchant(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
    let role = decoded
        .claims
        .role
        .parse::<Role>()
        .map_err(|_| AppError::Unauthorized("Invalid role in token".into()))?;

    Ok(AuthUser { user_id, role })
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
        .trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized("Missing bearer token".into()));
    }
    Ok(Some(token))
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;
        let state = AppState::from_ref(state);
        decode_token(state.config.jwt_secret.expose_secret(), token)
    }
}

/// Caller identity for endpoints that also serve anonymous visitors.
/// A present but invalid token is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts)? else {
            return Ok(MaybeAuthUser(None));
        };
        let state = AppState::from_ref(state);
        decode_token(state.config.jwt_secret.expose_secret(), token).map(|u| MaybeAuthUser(Some(u)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::issue_token;

    #[test]
    fn issued_tokens_decode_to_the_same_identity() {
        let user_id = Uuid::new_v4();
        let (token, _) = issue_token("secret", user_id, Role::Merchant, 1).unwrap();
        let user = decode_token("secret", &token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, Role::Merchant);
        assert!(user.is_staff());
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let (token, _) = issue_token("secret", Uuid::new_v4(), Role::Customer, 1).unwrap();
        let err = decode_token("other", &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let (token, _) = issue_token("secret", Uuid::new_v4(), Role::Customer, -2).unwrap();
        assert!(decode_token("secret", &token).is_err());
    }

    #[test]
    fn merchant_guard() {
        let customer = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        };
        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(ensure_merchant(&customer).is_err());
        assert!(ensure_merchant(&admin).is_ok());
        assert!(ensure_admin(&admin).is_ok());
        assert!(ensure_admin(&customer).is_err());
    }
}
