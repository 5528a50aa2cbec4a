use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use tower_cookies::{Cookies, Key};

use super::error::{ApiError, ApiResult};
use crate::entities::{user::Role, User};

pub const SESSION_COOKIE: &str = "herdbook_session";

/// Signing key for the session cookie, shared through an `Extension`.
#[derive(Clone)]
pub struct SessionKey(pub Key);

/// The logged-in user, inserted into request extensions by [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn require_admin(&self) -> ApiResult<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Viewer => Err(ApiError::Forbidden("Admin role required".to_string())),
        }
    }
}

pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(SessionKey(key)): Extension<SessionKey>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = cookies
        .signed(&key)
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<i32>().ok());

    let Some(user_id) = user_id else {
        return ApiError::unauthorized().into_response();
    };

    match User::find_by_id(user_id).one(&db).await {
        Ok(Some(user)) => {
            tracing::Span::current()
                .record("user_id", user.id)
                .record("user_email", user.email.as_str());
            request.extensions_mut().insert(CurrentUser {
                id: user.id,
                email: user.email,
                role: user.role,
            });
            next.run(request).await
        }
        // Stale cookie for a user that no longer exists.
        Ok(None) => ApiError::unauthorized().into_response(),
        Err(e) => ApiError::Database(e).into_response(),
    }
}
