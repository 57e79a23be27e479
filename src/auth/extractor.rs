use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::jwt;
use crate::auth::policy::Principal;
use crate::db;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

/// An authenticated, active user. Role is read from the database on every
/// request so demotions and deactivations apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            role: self.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Not enough permissions".to_string()))
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(auth_header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .or_else(|| auth_str.strip_prefix("bearer "))
        .map(Some)
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".to_string()))
}

async fn authenticate(token: &str, state: &SharedState) -> Result<AuthUser, AppError> {
    let invalid = || AppError::Unauthorized("Could not validate credentials".to_string());

    let claims = jwt::decode_token(token, &state.config.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected bearer token: {e}");
        invalid()
    })?;
    let user_id = claims.user_id().ok_or_else(invalid)?;

    let user = db::users::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".to_string()));
    }

    Ok(AuthUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing authentication token".to_string()))?;
        authenticate(token, state).await
    }
}

/// `Option<AuthUser>` for endpoints open to anonymous readers. A missing,
/// malformed or invalid token, or an inactive account, yields `None`.
impl OptionalFromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Ok(Some(token)) = bearer_token(parts) else {
            return Ok(None);
        };

        match authenticate(token, state).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::Database(e)) => Err(AppError::Database(e)),
            Err(_) => Ok(None),
        }
    }
}
