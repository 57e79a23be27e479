use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::auth::policy::{Action, Principal};
use crate::db;
use crate::db::tasks::Visibility;
use crate::error::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::{NewTask, Task, TaskChanges, TaskFilter, TaskPriority, TaskStatus};
use crate::ordering;
use crate::pagination::Pagination;
use crate::patch;
use crate::routes::boards::load_authorized;
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct ListParams {
    pub board_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub board_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub board_id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub position: Option<i32>,
    pub assigned_to: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Deserialize)]
pub struct MoveTask {
    pub status: TaskStatus,
    pub position: Option<i32>,
}

#[derive(Deserialize)]
pub struct AssignTask {
    pub assigned_to: Option<i64>,
}

/// Load a task and check `principal` may perform `action` on its board.
async fn load_task_authorized(
    state: &SharedState,
    task_id: i64,
    principal: Option<&Principal>,
    action: Action,
) -> Result<Task, AppError> {
    let task = db::tasks::find_by_id(&state.pool, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
    load_authorized(state, task.board_id, principal, action).await?;
    Ok(task)
}

async fn ensure_assignable(state: &SharedState, user_id: i64) -> Result<(), AppError> {
    match db::users::find_by_id(&state.pool, user_id).await? {
        Some(user) if user.is_active => Ok(()),
        _ => Err(AppError::BadRequest("Assignee does not exist".to_string())),
    }
}

pub async fn list(
    auth: Option<AuthUser>,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Task>>, AppError> {
    let board_id = params
        .board_id
        .ok_or_else(|| AppError::BadRequest("board_id is required".to_string()))?;

    let principal = auth.as_ref().map(AuthUser::principal);
    load_authorized(&state, board_id, principal.as_ref(), Action::Read).await?;

    let filter = TaskFilter {
        board_id: Some(board_id),
        status: params.status,
        priority: params.priority,
        assigned_to: params.assigned_to,
    };
    let (limit, offset) = Pagination {
        page: params.page,
        limit: params.limit,
    }
    .resolve(state.config.max_page_size);

    let tasks = db::tasks::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(tasks))
}

pub async fn search(
    auth: Option<AuthUser>,
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Task>>, AppError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::BadRequest(
            "Search query must not be empty".to_string(),
        ));
    }

    let principal = auth.as_ref().map(AuthUser::principal);
    if let Some(board_id) = params.board_id {
        load_authorized(&state, board_id, principal.as_ref(), Action::Read).await?;
    }

    let visibility = match principal {
        Some(p) if p.is_admin() => Visibility::All,
        Some(p) => Visibility::PublicOrOwnedBy(p.user_id),
        None => Visibility::PublicOnly,
    };
    let (limit, offset) = Pagination {
        page: params.page,
        limit: params.limit,
    }
    .resolve(state.config.max_page_size);

    let tasks = db::tasks::search(
        &state.pool,
        query,
        params.board_id,
        visibility,
        limit,
        offset,
    )
    .await?;
    Ok(Json(tasks))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    load_authorized(&state, req.board_id, Some(&auth.principal()), Action::Write).await?;

    let title = validation::required_text("Title", &req.title, validation::TASK_TITLE_MAX)?;
    let description = validation::optional_text(
        "Description",
        req.description.as_deref(),
        validation::TASK_DESCRIPTION_MAX,
    )?;
    let position = req.position.map(validation::position).transpose()?;
    if let Some(assignee) = req.assigned_to {
        ensure_assignable(&state, assignee).await?;
    }

    let new_task = NewTask {
        board_id: req.board_id,
        title,
        description,
        status: req.status,
        priority: req.priority,
        position,
        assigned_to: req.assigned_to,
        due_date: req.due_date,
    };
    let task = ordering::create_task(&state.pool, &new_task).await?;

    tracing::info!(task_id = task.id, board_id = task.board_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get(
    auth: Option<AuthUser>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    let principal = auth.as_ref().map(AuthUser::principal);
    let task = load_task_authorized(&state, id, principal.as_ref(), Action::Read).await?;
    Ok(Json(task))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTask>,
) -> Result<Json<Task>, AppError> {
    let task = load_task_authorized(&state, id, Some(&auth.principal()), Action::Write).await?;

    let changes = TaskChanges {
        title: req
            .title
            .map(|t| validation::required_text("Title", &t, validation::TASK_TITLE_MAX))
            .transpose()?,
        description: req
            .description
            .map(|d| {
                validation::optional_text(
                    "Description",
                    d.as_deref(),
                    validation::TASK_DESCRIPTION_MAX,
                )
            })
            .transpose()?,
        priority: req.priority,
        due_date: req.due_date,
    };

    if changes.is_empty() {
        return Ok(Json(task));
    }

    let updated = db::tasks::update(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = id, user_id = auth.user_id, "Task updated");

    Ok(Json(updated))
}

pub async fn move_task(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveTask>,
) -> Result<Json<Task>, AppError> {
    load_task_authorized(&state, id, Some(&auth.principal()), Action::Write).await?;
    let position = req.position.map(validation::position).transpose()?;

    let moved = ordering::move_task(&state.pool, id, req.status, position)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    Ok(Json(moved))
}

pub async fn assign(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignTask>,
) -> Result<Json<Task>, AppError> {
    load_task_authorized(&state, id, Some(&auth.principal()), Action::Write).await?;
    if let Some(assignee) = req.assigned_to {
        ensure_assignable(&state, assignee).await?;
    }

    let task = db::tasks::assign(&state.pool, id, req.assigned_to)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = id, assigned_to = ?task.assigned_to, "Task assigned");

    Ok(Json(task))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    load_task_authorized(&state, id, Some(&auth.principal()), Action::Write).await?;

    if !db::tasks::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = id, user_id = auth.user_id, "Task deleted");

    Ok(Json(serde_json::json!({ "message": "Deleted", "deleted_task_id": id })))
}
