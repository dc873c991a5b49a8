use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::db::repositories::task_repository::{TaskRepository, TaskRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::analytics::{
    AnalysisStats, CompletionTimeOutcome, DateRangeEcho, FullAnalysisReport, PatternSummary,
    ProductivityReport,
};
use crate::models::task::{TaskRecord, STATUS_COMPLETED};
use crate::services::task_analytics::{
    analyze_productivity_by_day_in, analyze_task_completion_time, analyze_task_patterns,
    analyze_task_patterns_payload, parse_timestamp, TaskSnapshot,
};
use crate::services::{normalize_optional_string, require_user};

/// Loads stored tasks and feeds them to the analyzers.
#[derive(Clone)]
pub struct AnalysisService {
    db: DbPool,
    timezone: Tz,
}

impl AnalysisService {
    pub fn new(db: DbPool, timezone: Tz) -> Self {
        Self { db, timezone }
    }

    /// Status breakdown of a user's stored tasks, or of a raw task payload
    /// when no user is named.
    pub fn analyze_tasks(
        &self,
        user_id: Option<&str>,
        payload: Option<&JsonValue>,
    ) -> AppResult<PatternSummary> {
        let user_id = user_id.map(str::trim).filter(|id| !id.is_empty());
        let payload = payload.filter(|value| !value.is_null());

        match (user_id, payload) {
            (Some(user_id), _) => {
                let tasks = self.load_tasks(user_id)?;
                if tasks.is_empty() {
                    return Err(AppError::not_found("tasks"));
                }
                Ok(analyze_task_patterns(&tasks))
            }
            (None, Some(payload)) => analyze_task_patterns_payload(Some(payload)),
            (None, None) => Err(AppError::validation("No tasks or user ID provided")),
        }
    }

    /// Weekday breakdown of a user's completed tasks, optionally bounded on
    /// the last update time. Either bound may be given alone.
    pub fn productivity(
        &self,
        user_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> AppResult<ProductivityReport> {
        let start_raw = normalize_optional_string(start_date.map(str::to_string));
        let end_raw = normalize_optional_string(end_date.map(str::to_string));
        let start = start_raw
            .as_deref()
            .map(|raw| parse_bound(raw, "startDate"))
            .transpose()?;
        let end = end_raw
            .as_deref()
            .map(|raw| parse_bound(raw, "endDate"))
            .transpose()?;

        let completed = self
            .load_tasks(user_id)?
            .into_iter()
            .filter(|task| task.status == STATUS_COMPLETED)
            .filter(|task| within(task.activity_at(), start, end))
            .collect::<Vec<_>>();

        if completed.is_empty() {
            return Err(AppError::not_found("completed tasks"));
        }

        debug!(
            target: "app::analytics",
            user_id = %user_id,
            completed = completed.len(),
            "running productivity analysis"
        );

        Ok(ProductivityReport {
            analysis: analyze_productivity_by_day_in(&completed, &self.timezone),
            date_range: DateRangeEcho::new(start_raw.as_deref(), end_raw.as_deref()),
        })
    }

    /// Estimate-versus-actual breakdown over the user's tasks that carry both
    /// durations.
    pub fn completion_times(&self, user_id: &str) -> AppResult<CompletionTimeOutcome> {
        let timed = self
            .load_tasks(user_id)?
            .into_iter()
            .filter(is_timed)
            .collect::<Vec<_>>();

        if timed.is_empty() {
            return Err(AppError::not_found("tasks with time estimates"));
        }
        Ok(analyze_task_completion_time(&timed))
    }

    pub fn full_analysis(&self, user_id: &str) -> AppResult<FullAnalysisReport> {
        let tasks = self.db.with_connection(|conn| {
            require_user(conn, user_id)?;
            TaskRepository::list_by_user(conn, user_id)
        })?;
        let tasks = tasks
            .into_iter()
            .map(TaskRow::into_record)
            .collect::<Vec<_>>();

        if tasks.is_empty() {
            return Err(AppError::not_found("tasks"));
        }

        let completed = tasks
            .iter()
            .filter(|task| task.status == STATUS_COMPLETED)
            .collect::<Vec<_>>();
        let timed = tasks.iter().filter(|task| is_timed(task)).collect::<Vec<_>>();

        let stats = AnalysisStats {
            patterns: analyze_task_patterns(&tasks),
            productivity: analyze_productivity_by_day_in(&completed, &self.timezone),
            completion_times: analyze_task_completion_time(&timed),
        };
        debug!(
            target: "app::analytics",
            user_id = %user_id,
            total = tasks.len(),
            completed = completed.len(),
            timed = timed.len(),
            "full analysis generated"
        );

        Ok(FullAnalysisReport {
            user: user_id.to_string(),
            stats,
            total_tasks: tasks.len(),
        })
    }

    fn load_tasks(&self, user_id: &str) -> AppResult<Vec<TaskRecord>> {
        let rows = self
            .db
            .with_connection(|conn| TaskRepository::list_by_user(conn, user_id))?;
        Ok(rows.into_iter().map(TaskRow::into_record).collect())
    }
}

fn is_timed(task: &TaskRecord) -> bool {
    task.estimated_time.is_some() && task.actual_time.is_some()
}

fn within(
    at: Option<DateTime<Utc>>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    match at {
        Some(at) => !start.is_some_and(|s| at < s) && !end.is_some_and(|e| at > e),
        None => false,
    }
}

fn parse_bound(raw: &str, field: &str) -> AppResult<DateTime<Utc>> {
    parse_timestamp(raw).ok_or_else(|| {
        AppError::validation(format!("{field} must be an RFC 3339 timestamp or YYYY-MM-DD date"))
    })
}
