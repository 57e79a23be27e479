//! Board access rules.
//!
//! Tasks have no access rules of their own: a task is readable or writable
//! exactly when its board is.

use crate::error::AppError;
use crate::models::{Board, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

/// The authenticated actor behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn owns(&self, board: &Board) -> bool {
        board.owner_id == self.user_id
    }
}

/// Admins and owners may do anything; everyone else, anonymous callers
/// included, may only read public boards.
pub fn can_access(board: &Board, principal: Option<&Principal>, action: Action) -> bool {
    if let Some(p) = principal {
        if p.is_admin() || p.owns(board) {
            return true;
        }
    }

    match action {
        Action::Read => board.is_public,
        Action::Write => false,
    }
}

pub fn authorize(
    board: &Board,
    principal: Option<&Principal>,
    action: Action,
) -> Result<(), AppError> {
    if can_access(board, principal, action) {
        return Ok(());
    }
    let message = match action {
        Action::Read => "You do not have access to this board",
        Action::Write => "You do not have permission to modify this board",
    };
    Err(AppError::Forbidden(message.to_string()))
}
