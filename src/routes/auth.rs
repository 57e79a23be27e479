use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{encode_token, Claims};
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::extract::Json;
use crate::models::{Role, User};
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub user: User,
}

fn issue_token(state: &SharedState, user: User) -> Result<TokenResponse, AppError> {
    let ttl = state.config.token_expire_minutes;
    let access_token = encode_token(&Claims::new(user.id, ttl), &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: ttl.saturating_mul(60),
        user,
    })
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let username = validation::username(&req.username)?;
    validation::password(&req.password)?;
    let email = validation::email(req.email.as_deref())?;
    let full_name = validation::optional_text(
        "Full name",
        req.full_name.as_deref(),
        validation::FULL_NAME_MAX,
    )?;

    if db::users::find_by_username(&state.pool, &username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if let Some(email) = &email {
        if db::users::find_by_email(&state.pool, email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(
        &state.pool,
        &username,
        email.as_deref(),
        &pw_hash,
        full_name.as_deref(),
        Role::User,
    )
    .await
    .map_err(|e| AppError::from_unique(e, "Username or email already exists"))?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(issue_token(&state, user)?)))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let username = req.username.trim().to_lowercase();

    if state.login_limiter.check(&username).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Incorrect username or password".to_string());

    let Some(user) = db::users::find_by_username(&state.pool, &username).await? else {
        state.login_limiter.record_failure(&username);
        return Err(invalid());
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(&username);
        tracing::warn!(%username, "Failed login attempt");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".to_string()));
    }

    state.login_limiter.record_success(&username);
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(issue_token(&state, user)?))
}
