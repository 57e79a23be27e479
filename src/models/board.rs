use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A board row as returned by list endpoints.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct BoardSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub board: Board,
    pub tasks_count: i64,
}

/// A board with every task on it, ordered lane by lane.
#[derive(Debug, Clone, Serialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub tasks_count: i64,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default)]
pub struct BoardChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
}

impl BoardChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_public.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusStats {
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorityStats {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub board_id: i64,
    pub board_name: String,
    pub total_tasks: i64,
    pub status_stats: StatusStats,
    pub priority_stats: PriorityStats,
}

impl BoardStats {
    /// Fold grouped `(status, priority, count)` rows into per-status and per-priority totals.
    pub fn tally(board: &Board, counts: &[(TaskStatus, TaskPriority, i64)]) -> Self {
        let mut status_stats = StatusStats::default();
        let mut priority_stats = PriorityStats::default();

        for &(status, priority, n) in counts {
            match status {
                TaskStatus::Todo => status_stats.todo += n,
                TaskStatus::InProgress => status_stats.in_progress += n,
                TaskStatus::Done => status_stats.done += n,
            }
            match priority {
                TaskPriority::High => priority_stats.high += n,
                TaskPriority::Medium => priority_stats.medium += n,
                TaskPriority::Low => priority_stats.low += n,
            }
        }

        BoardStats {
            board_id: board.id,
            board_name: board.name.clone(),
            total_tasks: counts.iter().map(|&(_, _, n)| n).sum(),
            status_stats,
            priority_stats,
        }
    }
}
