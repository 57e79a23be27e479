use std::sync::LazyLock;

use regex::Regex;

use crate::auth::password::MIN_PASSWORD_LENGTH;
use crate::error::AppError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

fn bad(msg: impl Into<String>) -> AppError {
    AppError::BadRequest(msg.into())
}

/// Trimmed, lowercased, 3 to 20 characters.
pub fn username(raw: &str) -> Result<String, AppError> {
    let name = raw.trim().to_lowercase();
    let len = name.chars().count();
    if len < 3 {
        return Err(bad("Username must be at least 3 characters"));
    }
    if len > 20 {
        return Err(bad("Username must be at most 20 characters"));
    }
    Ok(name)
}

pub fn password(raw: &str) -> Result<(), AppError> {
    if raw.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(bad(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Trimmed and lowercased. Blank input means "no email".
pub fn email(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if value.len() > 100 || !EMAIL_RE.is_match(value) {
        return Err(bad("Invalid email address"));
    }
    Ok(Some(value.to_lowercase()))
}

/// Trim and require 1..=max characters.
pub fn required_text(field: &str, raw: &str, max: usize) -> Result<String, AppError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(bad(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(bad(format!("{field} must be at most {max} characters")));
    }
    Ok(value.to_string())
}

/// Optional free text capped at `max` characters. Blank input means "none".
pub fn optional_text(
    field: &str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>, AppError> {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(bad(format!("{field} must be at most {max} characters")));
    }
    Ok(Some(value.to_string()))
}

pub fn position(value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(bad("Position must be a non-negative integer"));
    }
    Ok(value)
}

pub const BOARD_NAME_MAX: usize = 100;
pub const BOARD_DESCRIPTION_MAX: usize = 500;
pub const TASK_TITLE_MAX: usize = 200;
pub const TASK_DESCRIPTION_MAX: usize = 1000;
pub const FULL_NAME_MAX: usize = 100;
