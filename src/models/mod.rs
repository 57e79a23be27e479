pub mod board;
pub mod task;
pub mod user;

pub use board::{Board, BoardChanges, BoardDetail, BoardStats, BoardSummary};
pub use task::{NewTask, Task, TaskChanges, TaskFilter, TaskPriority, TaskStatus};
pub use user::{Role, User, UserChanges};
