use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::auth::policy::{self, Action, Principal};
use crate::db;
use crate::error::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::{Board, BoardChanges, BoardDetail, BoardStats, BoardSummary};
use crate::pagination::Pagination;
use crate::patch;
use crate::state::SharedState;
use crate::validation;

#[derive(Deserialize)]
pub struct CreateBoard {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Deserialize)]
pub struct UpdateBoard {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
}

/// Load a board and check `principal` may perform `action` on it.
/// A missing board is `NotFound`; an inaccessible one is `Forbidden`.
pub(crate) async fn load_authorized(
    state: &SharedState,
    board_id: i64,
    principal: Option<&Principal>,
    action: Action,
) -> Result<Board, AppError> {
    let board = db::boards::find_by_id(&state.pool, board_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;
    policy::authorize(&board, principal, action)?;
    Ok(board)
}

async fn summary(state: &SharedState, id: i64) -> Result<BoardSummary, AppError> {
    db::boards::find_summary(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<BoardSummary>>, AppError> {
    let (limit, offset) = page.resolve(state.config.max_page_size);
    let boards = if auth.is_admin() {
        db::boards::list_all(&state.pool, limit, offset).await?
    } else {
        db::boards::list_owned(&state.pool, auth.user_id, limit, offset).await?
    };
    Ok(Json(boards))
}

pub async fn list_public(
    State(state): State<SharedState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<BoardSummary>>, AppError> {
    let (limit, offset) = page.resolve(state.config.max_page_size);
    let boards = db::boards::list_public(&state.pool, limit, offset).await?;
    Ok(Json(boards))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateBoard>,
) -> Result<(StatusCode, Json<BoardSummary>), AppError> {
    let name = validation::required_text("Board name", &req.name, validation::BOARD_NAME_MAX)?;
    let description = validation::optional_text(
        "Description",
        req.description.as_deref(),
        validation::BOARD_DESCRIPTION_MAX,
    )?;

    let board = db::boards::create(
        &state.pool,
        auth.user_id,
        &name,
        description.as_deref(),
        req.is_public,
    )
    .await?;

    tracing::info!(board_id = board.id, owner_id = board.owner_id, "Board created");

    Ok((
        StatusCode::CREATED,
        Json(BoardSummary {
            board,
            tasks_count: 0,
        }),
    ))
}

pub async fn get(
    auth: Option<AuthUser>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<BoardDetail>, AppError> {
    let principal = auth.as_ref().map(AuthUser::principal);
    let board = load_authorized(&state, id, principal.as_ref(), Action::Read).await?;

    let tasks = db::tasks::list_by_board(&state.pool, board.id).await?;
    Ok(Json(BoardDetail {
        board,
        tasks_count: tasks.len() as i64,
        tasks,
    }))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBoard>,
) -> Result<Json<BoardSummary>, AppError> {
    load_authorized(&state, id, Some(&auth.principal()), Action::Write).await?;

    let changes = BoardChanges {
        name: req
            .name
            .map(|n| validation::required_text("Board name", &n, validation::BOARD_NAME_MAX))
            .transpose()?,
        description: req
            .description
            .map(|d| {
                validation::optional_text(
                    "Description",
                    d.as_deref(),
                    validation::BOARD_DESCRIPTION_MAX,
                )
            })
            .transpose()?,
        is_public: req.is_public,
    };

    if !changes.is_empty() {
        db::boards::update(&state.pool, id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;
        tracing::info!(board_id = id, user_id = auth.user_id, "Board updated");
    }

    Ok(Json(summary(&state, id).await?))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    load_authorized(&state, id, Some(&auth.principal()), Action::Write).await?;

    let deleted_tasks = db::boards::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".to_string()))?;

    tracing::info!(board_id = id, deleted_tasks, "Board deleted");

    Ok(Json(serde_json::json!({
        "message": "Deleted",
        "deleted_tasks_count": deleted_tasks,
    })))
}

pub async fn stats(
    auth: Option<AuthUser>,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<BoardStats>, AppError> {
    let principal = auth.as_ref().map(AuthUser::principal);
    let board = load_authorized(&state, id, principal.as_ref(), Action::Read).await?;

    let counts = db::boards::task_counts(&state.pool, board.id).await?;
    Ok(Json(BoardStats::tally(&board, &counts)))
}
