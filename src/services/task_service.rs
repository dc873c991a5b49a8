use chrono::DateTime;
use tracing::{debug, info};

use crate::db::repositories::task_repository::{TaskRepository, TaskRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::task::{
    TaskCreateInput, TaskRecord, TaskUpdateInput, STATUS_COMPLETED, STATUS_PENDING,
    VALID_STATUSES,
};
use crate::services::{normalize_date, now_rfc3339, require_user};

const MAX_TITLE_LEN: usize = 160;

#[derive(Clone)]
pub struct TaskService {
    db: DbPool,
}

impl TaskService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn register_task(&self, input: TaskCreateInput) -> AppResult<TaskRecord> {
        if [
            &input.title,
            &input.description,
            &input.start_date,
            &input.due_date,
            &input.user_id,
        ]
        .iter()
        .any(|value| value.trim().is_empty())
        {
            return Err(AppError::validation(
                "Please include all required fields including userId",
            ));
        }

        let mut record = build_record_from_create(input)?;
        let now = now_rfc3339();
        record.id = uuid::Uuid::new_v4().to_string();
        if record.status == STATUS_COMPLETED {
            record.completed_at = Some(now.clone());
        }
        record.created_at = now.clone();
        record.updated_at = now;

        validate_record(&record)?;

        let row = TaskRow::from_record(&record);
        self.db.with_connection(|conn| {
            require_user(conn, &row.user_id)?;
            TaskRepository::insert(conn, &row)
        })?;
        info!(task_id = %record.id, user_id = %record.user_id, "task registered");
        Ok(record)
    }

    /// Applies a partial update. Blank strings leave the stored value alone.
    pub fn update_task(&self, id: &str, update: TaskUpdateInput) -> AppResult<TaskRecord> {
        let mut existing = self.get_task(id)?;
        let now = now_rfc3339();
        apply_update(&mut existing, update, &now)?;
        existing.updated_at = now;
        validate_record(&existing)?;

        let row = TaskRow::from_record(&existing);
        self.db
            .with_connection(|conn| TaskRepository::update(conn, &row))?;
        info!(task_id = %existing.id, status = %existing.status, "task updated");
        Ok(existing)
    }

    pub fn delete_task(&self, id: &str) -> AppResult<()> {
        self.db
            .with_connection(|conn| TaskRepository::delete(conn, id))?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> AppResult<TaskRecord> {
        let row = self
            .db
            .with_connection(|conn| TaskRepository::find_by_id(conn, id))?
            .ok_or_else(|| AppError::not_found("task"))?;
        let record = row.into_record();
        debug!(task_id = %record.id, "task fetched");
        Ok(record)
    }

    /// Every task, or only those of `user_id` when given. An unknown user
    /// simply has no tasks here.
    pub fn list_tasks(&self, user_id: Option<&str>) -> AppResult<Vec<TaskRecord>> {
        let rows = self.db.with_connection(|conn| match user_id {
            Some(user_id) => TaskRepository::list_by_user(conn, user_id),
            None => TaskRepository::list_all(conn),
        })?;
        let tasks = rows
            .into_iter()
            .map(TaskRow::into_record)
            .collect::<Vec<_>>();
        debug!(count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    /// Tasks of an existing user; an unknown user is `NotFound`.
    pub fn list_tasks_by_user(&self, user_id: &str) -> AppResult<Vec<TaskRecord>> {
        let rows = self.db.with_connection(|conn| {
            require_user(conn, user_id)?;
            TaskRepository::list_by_user(conn, user_id)
        })?;
        let tasks = rows
            .into_iter()
            .map(TaskRow::into_record)
            .collect::<Vec<_>>();
        debug!(user_id = %user_id, count = tasks.len(), "user tasks listed");
        Ok(tasks)
    }
}

fn build_record_from_create(input: TaskCreateInput) -> AppResult<TaskRecord> {
    let title = normalize_title(&input.title)?;
    let description = input.description.trim().to_string();
    let start_date = normalize_date(&input.start_date, "startDate")?;
    let due_date = normalize_date(&input.due_date, "dueDate")?;
    let status = normalize_status(input.status)?;
    let estimated_time = normalize_duration(input.estimated_time, "estimatedTime")?;
    let actual_time = normalize_duration(input.actual_time, "actualTime")?;

    Ok(TaskRecord {
        id: String::new(),
        title,
        description,
        start_date,
        due_date,
        status,
        estimated_time,
        actual_time,
        completed_at: None,
        user_id: input.user_id.trim().to_string(),
        created_at: String::new(),
        updated_at: String::new(),
    })
}

fn apply_update(record: &mut TaskRecord, update: TaskUpdateInput, now: &str) -> AppResult<()> {
    if let Some(title) = non_blank(update.title) {
        record.title = normalize_title(&title)?;
    }

    if let Some(description) = non_blank(update.description) {
        record.description = description.trim().to_string();
    }

    if let Some(start_date) = non_blank(update.start_date) {
        record.start_date = normalize_date(&start_date, "startDate")?;
    }

    if let Some(due_date) = non_blank(update.due_date) {
        record.due_date = normalize_date(&due_date, "dueDate")?;
    }

    if let Some(status) = non_blank(update.status) {
        record.status = normalize_status(Some(status))?;
        if record.status == STATUS_COMPLETED && record.completed_at.is_none() {
            record.completed_at = Some(now.to_string());
        }
    }

    if let Some(estimated_time) = update.estimated_time {
        record.estimated_time = normalize_duration(estimated_time, "estimatedTime")?;
    }

    if let Some(actual_time) = update.actual_time {
        record.actual_time = normalize_duration(actual_time, "actualTime")?;
    }

    Ok(())
}

fn validate_record(record: &TaskRecord) -> AppResult<()> {
    let start = DateTime::parse_from_rfc3339(&record.start_date)
        .map_err(|_| AppError::validation("startDate is not a valid timestamp"))?;
    let due = DateTime::parse_from_rfc3339(&record.due_date)
        .map_err(|_| AppError::validation("dueDate is not a valid timestamp"))?;
    if due < start {
        return Err(AppError::validation("dueDate cannot be earlier than startDate"));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("title is required"));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_status(status: Option<String>) -> AppResult<String> {
    let value = status
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| STATUS_PENDING.to_string());
    if VALID_STATUSES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(AppError::validation_with_details(
            format!("status must be one of {}", VALID_STATUSES.join(", ")),
            serde_json::json!({ "field": "status", "value": value }),
        ))
    }
}

/// Minutes. Zero is a legitimate duration.
fn normalize_duration(value: Option<f64>, field: &str) -> AppResult<Option<f64>> {
    match value {
        Some(minutes) if !minutes.is_finite() || minutes < 0.0 => Err(AppError::validation(
            format!("{field} must be a finite, non-negative number of minutes"),
        )),
        other => Ok(other),
    }
}
