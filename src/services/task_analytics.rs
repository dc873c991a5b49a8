//! Pure summaries over task collections.
//!
//! Nothing in here touches storage: callers fetch a task snapshot, hand it to
//! one or more analyzers and serialize whatever comes back. Every analyzer is
//! a free function over a slice, so concurrent callers need no coordination.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::analytics::{
    AnalyticsTaskInput, CompletionTimeOutcome, CompletionTimeSummary, PatternSummary,
    ProductivityOutcome, ProductivitySummary, TimingCategory,
};
use crate::models::task::{TaskRecord, STATUS_COMPLETED, STATUS_PENDING};
use crate::utils::rounding::round_half_up;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Grouping key for payload tasks that carry no status at all.
pub const MISSING_STATUS_KEY: &str = "undefined";

const AVERAGE_PRECISION: i32 = 2;

/// Read-only view of the task fields the analyzers look at.
pub trait TaskSnapshot {
    fn status(&self) -> Option<&str>;
    fn estimated_time(&self) -> Option<f64>;
    fn actual_time(&self) -> Option<f64>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Timestamp used for weekday bucketing: `updated_at`, else `created_at`.
    fn activity_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at().or_else(|| self.created_at())
    }

    fn has_status(&self, status: &str) -> bool {
        self.status() == Some(status)
    }
}

impl<T: TaskSnapshot + ?Sized> TaskSnapshot for &T {
    fn status(&self) -> Option<&str> {
        (**self).status()
    }

    fn estimated_time(&self) -> Option<f64> {
        (**self).estimated_time()
    }

    fn actual_time(&self) -> Option<f64> {
        (**self).actual_time()
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        (**self).updated_at()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        (**self).created_at()
    }
}

impl TaskSnapshot for TaskRecord {
    fn status(&self) -> Option<&str> {
        Some(self.status.as_str())
    }

    fn estimated_time(&self) -> Option<f64> {
        self.estimated_time
    }

    fn actual_time(&self) -> Option<f64> {
        self.actual_time
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

impl TaskSnapshot for AnalyticsTaskInput {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn estimated_time(&self) -> Option<f64> {
        self.estimated_time
    }

    fn actual_time(&self) -> Option<f64> {
        self.actual_time
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// Status distribution over an arbitrary task set.
pub fn analyze_task_patterns<T: TaskSnapshot>(tasks: &[T]) -> PatternSummary {
    let mut tasks_by_status: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        let key = task.status().unwrap_or(MISSING_STATUS_KEY);
        *tasks_by_status.entry(key.to_string()).or_insert(0) += 1;
    }

    let completed_tasks = tasks_by_status.get(STATUS_COMPLETED).copied().unwrap_or(0);
    debug!(
        target: "app::analytics",
        total = tasks.len(),
        statuses = tasks_by_status.len(),
        "task patterns analysed"
    );

    PatternSummary {
        total_tasks: tasks.len(),
        completed_tasks,
        tasks_by_status,
    }
}

/// Completed tasks per weekday, with weekdays taken in UTC.
pub fn analyze_productivity_by_day<T: TaskSnapshot>(tasks: &[T]) -> ProductivityOutcome {
    analyze_productivity_by_day_in(tasks, &Utc)
}

/// Completed tasks per weekday, with weekdays taken in `tz`.
///
/// Tasks that are neither completed nor pending are ignored. A completed task
/// without any usable timestamp still counts toward the total but lands in no
/// weekday bucket.
pub fn analyze_productivity_by_day_in<T, Z>(tasks: &[T], tz: &Z) -> ProductivityOutcome
where
    T: TaskSnapshot,
    Z: TimeZone,
{
    let completed: Vec<&T> = tasks
        .iter()
        .filter(|task| task.has_status(STATUS_COMPLETED))
        .collect();

    if completed.is_empty() {
        debug!(target: "app::analytics", total = tasks.len(), "no completed tasks to bucket");
        return ProductivityOutcome::NoCompletedTasks;
    }

    let total_pending_tasks = tasks
        .iter()
        .filter(|task| task.has_status(STATUS_PENDING))
        .count();

    let mut day_counts = [0usize; 7];
    let mut unbucketed = 0usize;
    for task in &completed {
        match task.activity_at() {
            Some(at) => {
                let index = at.with_timezone(tz).weekday().num_days_from_sunday() as usize;
                day_counts[index] += 1;
            }
            None => unbucketed += 1,
        }
    }

    let productivity_by_day = day_counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(index, count)| (DAY_NAMES[index].to_string(), *count))
        .collect::<BTreeMap<_, _>>();

    debug!(
        target: "app::analytics",
        completed = completed.len(),
        pending = total_pending_tasks,
        unbucketed,
        "productivity by day analysed"
    );

    ProductivityOutcome::Summary(ProductivitySummary {
        total_completed_tasks: completed.len(),
        total_pending_tasks,
        productivity_by_day,
    })
}

/// Estimate-versus-actual breakdown over tasks that carry both durations.
///
/// Presence is checked explicitly, so a zero estimate or a zero actual time is
/// a real measurement and takes part in the analysis.
pub fn analyze_task_completion_time<T: TaskSnapshot>(tasks: &[T]) -> CompletionTimeOutcome {
    if tasks.is_empty() {
        return CompletionTimeOutcome::NoTasks;
    }

    let deltas: Vec<f64> = tasks
        .iter()
        .filter_map(|task| match (task.estimated_time(), task.actual_time()) {
            (Some(estimated), Some(actual)) => Some(actual - estimated),
            _ => None,
        })
        .collect();

    if deltas.is_empty() {
        debug!(target: "app::analytics", total = tasks.len(), "no timed tasks to analyse");
        return CompletionTimeOutcome::NoTimedTasks;
    }

    let mut categorization: BTreeMap<TimingCategory, usize> = BTreeMap::new();
    for delta in &deltas {
        *categorization
            .entry(TimingCategory::from_delta(*delta))
            .or_insert(0) += 1;
    }

    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    let average_time_difference = round_half_up(mean, AVERAGE_PRECISION);

    debug!(
        target: "app::analytics",
        analysed = deltas.len(),
        average_time_difference,
        "completion times analysed"
    );

    CompletionTimeOutcome::Summary(CompletionTimeSummary {
        analyzed_tasks: deltas.len(),
        categorization,
        average_time_difference,
    })
}

/// Decodes a request payload that must be an array. Elements that are not
/// objects carry no usable fields and count as tasks without a status.
pub fn parse_task_payload(value: &JsonValue) -> AppResult<Vec<AnalyticsTaskInput>> {
    let items = value
        .as_array()
        .ok_or_else(|| AppError::invalid_input("Invalid tasks data provided for analysis."))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                debug!(target: "app::analytics", index, "payload element is not an object");
                return Ok(AnalyticsTaskInput::default());
            }
            serde_json::from_value::<AnalyticsTaskInput>(item.clone()).map_err(|err| {
                AppError::invalid_input(format!("task at index {index} is malformed: {err}"))
            })
        })
        .collect()
}

/// Pattern analysis over a raw payload; anything but an array is rejected.
pub fn analyze_task_patterns_payload(value: Option<&JsonValue>) -> AppResult<PatternSummary> {
    let value = value.ok_or_else(|| AppError::invalid_input("No tasks provided for analysis."))?;
    let tasks = parse_task_payload(value)?;
    Ok(analyze_task_patterns(&tasks))
}

/// Productivity analysis over a raw payload; anything but an array is rejected.
pub fn analyze_productivity_payload<Z: TimeZone>(
    value: Option<&JsonValue>,
    tz: &Z,
) -> AppResult<ProductivityOutcome> {
    let value = value.ok_or_else(|| AppError::invalid_input("No tasks provided for analysis."))?;
    let tasks = parse_task_payload(value)?;
    Ok(analyze_productivity_by_day_in(&tasks, tz))
}

/// Completion-time analysis over a raw payload. A missing or `null` payload
/// is the "no tasks" notice rather than an error.
pub fn analyze_completion_time_payload(
    value: Option<&JsonValue>,
) -> AppResult<CompletionTimeOutcome> {
    match value {
        None | Some(JsonValue::Null) => Ok(CompletionTimeOutcome::NoTasks),
        Some(value) => {
            let tasks = parse_task_payload(value)?;
            Ok(analyze_task_completion_time(&tasks))
        }
    }
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates taken as UTC midnight.
/// Anything else reads as absent.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
