use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde_json::json;
use tower_cookies::{Cookie, Cookies};

use super::error::{is_unique_violation, ApiError, ApiResult};
use super::middleware::{CurrentUser, SessionKey, SESSION_COOKIE};
use crate::entities::{
    user::{self, Role},
    User,
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(serde::Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    name: String,
}

fn user_json(user: &user::Model) -> serde_json::Value {
    json!({"id": user.id, "email": user.email, "name": user.name, "role": user.role})
}

/// Creates an account. The first account on an empty database is the admin.
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal("Failed to hash password".to_string()))?
        .to_string();

    let role = if User::find().count(&db).await? == 0 {
        Role::Admin
    } else {
        Role::Viewer
    };

    let now = chrono::Utc::now().naive_utc();
    let new_user = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(payload.name),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_user.insert(&db).await {
        Ok(user) => {
            tracing::Span::current()
                .record("table", "users")
                .record("action", "register_user")
                .record("user_id", user.id)
                .record("user_email", user.email.as_str())
                .record("business_event", "User registered successfully");

            Ok((StatusCode::CREATED, Json(user_json(&user))).into_response())
        }
        Err(e) if is_unique_violation(&e) => {
            tracing::Span::current()
                .record("table", "users")
                .record("action", "register_user_failed")
                .record("error", "duplicate_email");

            Err(ApiError::Conflict("Email already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(serde::Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Extension(SessionKey(key)): Extension<SessionKey>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find()
        .filter(user::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&db)
        .await?;

    let Some(user) = user else {
        tracing::Span::current()
            .record("table", "users")
            .record("action", "login_user_failed")
            .record("error", "invalid_credentials");
        return Err(invalid());
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| ApiError::Internal("Invalid password hash in DB".to_string()))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::Span::current()
            .record("table", "users")
            .record("action", "login_user_failed")
            .record("user_id", user.id)
            .record("error", "invalid_credentials");
        return Err(invalid());
    }

    let mut cookie = Cookie::new(SESSION_COOKIE, user.id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookies.signed(&key).add(cookie);

    tracing::Span::current()
        .record("table", "users")
        .record("action", "login_user")
        .record("user_id", user.id)
        .record("user_email", user.email.as_str())
        .record("business_event", "User logged in successfully");

    Ok((StatusCode::OK, Json(user_json(&user))).into_response())
}

pub async fn logout(cookies: Cookies) -> Response {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookies.remove(cookie);
    (StatusCode::OK, Json(json!({"message": "Logged out"}))).into_response()
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Response {
    (
        StatusCode::OK,
        Json(json!({"id": user.id, "email": user.email, "role": user.role})),
    )
        .into_response()
}
