use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{Board, BoardChanges, BoardSummary, TaskPriority, TaskStatus};

const SUMMARY_SELECT: &str = "SELECT b.*,
        (SELECT COUNT(*) FROM tasks t WHERE t.board_id = b.id) AS tasks_count
     FROM boards b";

pub async fn create(
    pool: &PgPool,
    owner_id: i64,
    name: &str,
    description: Option<&str>,
    is_public: bool,
) -> Result<Board, sqlx::Error> {
    sqlx::query_as::<_, Board>(
        "INSERT INTO boards (owner_id, name, description, is_public)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .bind(is_public)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Board>, sqlx::Error> {
    sqlx::query_as::<_, Board>("SELECT * FROM boards WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_summary(pool: &PgPool, id: i64) -> Result<Option<BoardSummary>, sqlx::Error> {
    sqlx::query_as::<_, BoardSummary>(&format!("{SUMMARY_SELECT} WHERE b.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_owned(
    pool: &PgPool,
    owner_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<BoardSummary>, sqlx::Error> {
    sqlx::query_as::<_, BoardSummary>(&format!(
        "{SUMMARY_SELECT} WHERE b.owner_id = $1 ORDER BY b.id LIMIT $2 OFFSET $3"
    ))
    .bind(owner_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn list_all(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<BoardSummary>, sqlx::Error> {
    sqlx::query_as::<_, BoardSummary>(&format!(
        "{SUMMARY_SELECT} ORDER BY b.id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn list_public(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<BoardSummary>, sqlx::Error> {
    sqlx::query_as::<_, BoardSummary>(&format!(
        "{SUMMARY_SELECT} WHERE b.is_public ORDER BY b.id LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Apply only the fields present in `changes`. Returns `None` if no such board.
pub async fn update(
    pool: &PgPool,
    id: i64,
    changes: &BoardChanges,
) -> Result<Option<Board>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE boards SET updated_at = now()");
    if let Some(name) = &changes.name {
        qb.push(", name = ").push_bind(name.clone());
    }
    if let Some(description) = &changes.description {
        qb.push(", description = ").push_bind(description.clone());
    }
    if let Some(is_public) = changes.is_public {
        qb.push(", is_public = ").push_bind(is_public);
    }
    qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    qb.build_query_as::<Board>().fetch_optional(pool).await
}

/// Delete a board and, by cascade, its tasks.
/// Returns the number of tasks removed, or `None` if the board did not exist.
pub async fn delete(pool: &PgPool, id: i64) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM boards WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Ok(None);
    }

    let task_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE board_id = $1")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM boards WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(Some(task_count))
}

/// Task counts per (status, priority) pair for one board.
pub async fn task_counts(
    pool: &PgPool,
    board_id: i64,
) -> Result<Vec<(TaskStatus, TaskPriority, i64)>, sqlx::Error> {
    sqlx::query_as(
        "SELECT status, priority, COUNT(*) FROM tasks
         WHERE board_id = $1 GROUP BY status, priority",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await
}
