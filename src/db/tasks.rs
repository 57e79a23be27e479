use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{NewTask, Task, TaskChanges, TaskFilter, TaskStatus};

/// Which boards a cross-board query may look into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    PublicOrOwnedBy(i64),
    PublicOnly,
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Fetch and row-lock a task for the rest of the transaction.
pub async fn find_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Number of tasks in the (board, status) lane.
pub async fn count_in_lane<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    board_id: i64,
    status: TaskStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE board_id = $1 AND status = $2")
        .bind(board_id)
        .bind(status)
        .fetch_one(executor)
        .await
}

/// Insert a task. Without an explicit position the lane count is computed in
/// the same statement, so the task lands at the end of its lane.
pub async fn insert(pool: &PgPool, task: &NewTask) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "INSERT INTO tasks
            (board_id, title, description, status, priority, assigned_to, due_date, position)
         VALUES ($1, $2, $3, $4, $5, $6, $7,
            COALESCE($8, (SELECT COUNT(*) FROM tasks WHERE board_id = $1 AND status = $4)::INTEGER))
         RETURNING *",
    )
    .bind(task.board_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.assigned_to)
    .bind(task.due_date)
    .bind(task.position)
    .fetch_one(pool)
    .await
}

/// Set status and, when given, position in one write. `None` keeps the position.
pub async fn set_lane<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
    status: TaskStatus,
    position: Option<i32>,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET status = $2, position = COALESCE($3, position), updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(position)
    .fetch_one(executor)
    .await
}

/// Tasks matching `filter`, in lane order.
pub async fn list(
    pool: &PgPool,
    filter: &TaskFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM tasks WHERE TRUE");
    if let Some(board_id) = filter.board_id {
        qb.push(" AND board_id = ").push_bind(board_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(assigned_to) = filter.assigned_to {
        qb.push(" AND assigned_to = ").push_bind(assigned_to);
    }
    qb.push(" ORDER BY board_id, status, position, id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<Task>().fetch_all(pool).await
}

pub async fn list_by_board(pool: &PgPool, board_id: i64) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE board_id = $1 ORDER BY status, position, id",
    )
    .bind(board_id)
    .fetch_all(pool)
    .await
}

/// Case-insensitive substring search over title and description.
pub async fn search(
    pool: &PgPool,
    query: &str,
    board_id: Option<i64>,
    visibility: Visibility,
    limit: i64,
    offset: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    let pattern = super::like_pattern(query);

    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT t.* FROM tasks t JOIN boards b ON b.id = t.board_id WHERE (t.title ILIKE ",
    );
    qb.push_bind(pattern.clone())
        .push(" OR t.description ILIKE ")
        .push_bind(pattern)
        .push(")");

    if let Some(board_id) = board_id {
        qb.push(" AND t.board_id = ").push_bind(board_id);
    }
    match visibility {
        Visibility::All => {}
        Visibility::PublicOrOwnedBy(user_id) => {
            qb.push(" AND (b.is_public OR b.owner_id = ")
                .push_bind(user_id)
                .push(")");
        }
        Visibility::PublicOnly => {
            qb.push(" AND b.is_public");
        }
    }
    qb.push(" ORDER BY t.board_id, t.status, t.position, t.id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<Task>().fetch_all(pool).await
}

/// Apply only the fields present in `changes`. Returns `None` if no such task.
pub async fn update(
    pool: &PgPool,
    id: i64,
    changes: &TaskChanges,
) -> Result<Option<Task>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = now()");
    if let Some(title) = &changes.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    if let Some(description) = &changes.description {
        qb.push(", description = ").push_bind(description.clone());
    }
    if let Some(priority) = changes.priority {
        qb.push(", priority = ").push_bind(priority);
    }
    if let Some(due_date) = changes.due_date {
        qb.push(", due_date = ").push_bind(due_date);
    }
    qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    qb.build_query_as::<Task>().fetch_optional(pool).await
}

pub async fn assign(
    pool: &PgPool,
    id: i64,
    assigned_to: Option<i64>,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET assigned_to = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(assigned_to)
    .fetch_optional(pool)
    .await
}

/// Returns false if no row matched.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
