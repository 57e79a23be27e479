//! Lane ordering for tasks.
//!
//! A lane is the set of tasks sharing a board and a status, rendered by
//! ascending `position`. Positions are never renumbered: an explicit position
//! is stored as given, ties included, and tied tasks render in id order.

use sqlx::PgPool;

use crate::db;
use crate::models::{NewTask, Task, TaskStatus};

/// Position a task should take when moved from `current` to `target`.
///
/// `lane_len` is the number of tasks already in the target lane. Returns
/// `None` when the position should stay as it is.
pub fn target_position(
    current: TaskStatus,
    target: TaskStatus,
    requested: Option<i32>,
    lane_len: i64,
) -> Option<i32> {
    match requested {
        Some(position) => Some(position),
        None if current != target => Some(i32::try_from(lane_len).unwrap_or(i32::MAX)),
        None => None,
    }
}

/// Create a task at the end of its lane unless a position is given.
pub async fn create_task(pool: &PgPool, task: &NewTask) -> Result<Task, sqlx::Error> {
    let created = db::tasks::insert(pool, task).await?;
    tracing::debug!(
        task_id = created.id,
        board_id = created.board_id,
        position = created.position,
        "Task created"
    );
    Ok(created)
}

/// Move a task to `status`, appending to that lane unless `position` is given.
/// Returns `None` if the task does not exist.
pub async fn move_task(
    pool: &PgPool,
    task_id: i64,
    status: TaskStatus,
    position: Option<i32>,
) -> Result<Option<Task>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(task) = db::tasks::find_for_update(&mut *tx, task_id).await? else {
        return Ok(None);
    };

    let lane_len = if position.is_none() && task.status != status {
        db::tasks::count_in_lane(&mut *tx, task.board_id, status).await?
    } else {
        0
    };

    let new_position = target_position(task.status, status, position, lane_len);
    let moved = db::tasks::set_lane(&mut *tx, task.id, status, new_position).await?;

    tx.commit().await?;

    tracing::debug!(
        task_id = moved.id,
        from = ?task.status,
        to = ?moved.status,
        position = moved.position,
        "Task moved"
    );
    Ok(Some(moved))
}
