use axum::extract::State;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::{Role, User, UserChanges};
use crate::pagination::Pagination;
use crate::patch;
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct UpdateProfile {
    #[serde(default, deserialize_with = "patch::nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub full_name: Option<Option<String>>,
}

#[derive(Deserialize)]
pub struct AdminUpdateUser {
    #[serde(default, deserialize_with = "patch::nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub full_name: Option<Option<String>>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

fn profile_changes(
    email: Option<Option<String>>,
    full_name: Option<Option<String>>,
) -> Result<UserChanges, AppError> {
    let email = email
        .map(|e| validation::email(e.as_deref()))
        .transpose()?;
    let full_name = full_name
        .map(|n| validation::optional_text("Full name", n.as_deref(), validation::FULL_NAME_MAX))
        .transpose()?;

    Ok(UserChanges {
        email,
        full_name,
        ..UserChanges::default()
    })
}

async fn ensure_email_free(
    state: &SharedState,
    changes: &UserChanges,
    user_id: i64,
) -> Result<(), AppError> {
    if let Some(Some(email)) = &changes.email {
        if let Some(existing) = db::users::find_by_email(&state.pool, email).await? {
            if existing.id != user_id {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
    }
    Ok(())
}

async fn apply_changes(
    state: &SharedState,
    user_id: i64,
    changes: &UserChanges,
) -> Result<User, AppError> {
    if changes.is_empty() {
        return db::users::find_by_id(&state.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()));
    }

    ensure_email_free(state, changes, user_id).await?;

    db::users::update(&state.pool, user_id, changes)
        .await
        .map_err(|e| AppError::from_unique(e, "Email already exists"))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn me(auth: AuthUser, State(state): State<SharedState>) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn update_me(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfile>,
) -> Result<Json<User>, AppError> {
    let changes = profile_changes(req.email, req.full_name)?;
    let user = apply_changes(&state, auth.user_id, &changes).await?;
    Ok(Json(user))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    validation::password(&req.new_password)?;

    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let valid = password::verify(&req.current_password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(serde_json::json!({ "message": "Password updated" })))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_admin()?;
    let (limit, offset) = page.resolve(state.config.max_page_size);
    let users = db::users::list(&state.pool, limit, offset).await?;
    Ok(Json(users))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AdminUpdateUser>,
) -> Result<Json<User>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        if req.role.is_some_and(|r| !r.is_admin()) {
            return Err(AppError::BadRequest(
                "You cannot remove your own admin role".to_string(),
            ));
        }
        if req.is_active == Some(false) {
            return Err(AppError::BadRequest(
                "You cannot deactivate your own account".to_string(),
            ));
        }
    }

    let mut changes = profile_changes(req.email, req.full_name)?;
    changes.role = req.role;
    changes.is_active = req.is_active;

    let user = apply_changes(&state, id, &changes).await?;

    tracing::info!(admin_id = auth.user_id, user_id = user.id, "User updated by admin");

    Ok(Json(user))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_admin()?;

    if id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !db::users::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(admin_id = auth.user_id, user_id = id, "User deleted");

    Ok(Json(serde_json::json!({ "message": "Deleted", "deleted_user_id": id })))
}
