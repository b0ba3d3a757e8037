use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{
    audit,
    domain::Role,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::is_unique_violation,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password,
        name,
        role,
    } = payload;
    let email = normalize_email(&email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role = match role.unwrap_or(Role::Customer) {
        Role::Admin => {
            return Err(AppError::BadRequest(
                "Admin accounts cannot be self-registered".into(),
            ));
        }
        other => other,
    };

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Email is already taken".into()));
    }

    let password_hash = hash_password(&password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())),
        role: Set(role.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Email is already taken".into())
        } else {
            err.into()
        }
    })?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "role": user.role }),
    )
    .await;

    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_ascii_lowercase();
    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let role = user.role.parse::<Role>()?;
    let (token, expires_at) = issue_token(
        state.config.jwt_secret.expose_secret(),
        user.id,
        role,
        state.config.jwt_ttl_hours,
    )?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            expires_at,
        },
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let found = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", User::from(found), None))
}

/// Sign an HS256 access token for `user_id`.
pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    role: Role,
    ttl_hours: i64,
) -> AppResult<(String, DateTime<Utc>)> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expiration.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok((token, expiration))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_ascii_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::BadRequest("Invalid email address".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ana@Shop.Test ").unwrap(), "ana@shop.test");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("@shop.test").is_err());
    }

    #[test]
    fn hashes_verify_against_the_original_password() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
