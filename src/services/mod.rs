pub mod analysis_service;
pub mod dashboard_service;
pub mod event_service;
pub mod health_service;
pub mod note_service;
pub mod task_analytics;
pub mod task_service;
pub mod user_service;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::db::repositories::user_repository::UserRepository;
use crate::error::{AppError, AppResult};

/// Fails with `NotFound("user")` unless `user_id` names a stored user.
pub(crate) fn require_user(conn: &Connection, user_id: &str) -> AppResult<()> {
    if UserRepository::exists(conn, user_id)? {
        Ok(())
    } else {
        Err(AppError::not_found("user"))
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn to_rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn required_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// `None` for absent or blank input.
pub(crate) fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|val| {
        let trimmed = val.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

/// Accepts RFC 3339 or `YYYY-MM-DD` and stores it as RFC 3339 UTC.
pub(crate) fn normalize_date(value: &str, field: &str) -> AppResult<String> {
    let trimmed = required_text(value, field)?;
    task_analytics::parse_timestamp(&trimmed)
        .map(to_rfc3339)
        .ok_or_else(|| {
            AppError::validation(format!(
                "{field} must be an RFC 3339 timestamp or YYYY-MM-DD date"
            ))
        })
}
