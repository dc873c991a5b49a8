use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::db::repositories::event_repository::{
    UrgentEventQuery, UrgentEventRepository, UrgentEventRow,
};
use crate::db::repositories::health_repository::{HealthQuery, HealthRepository, HealthRow};
use crate::db::repositories::note_repository::{NoteQuery, NoteRepository, NoteRow};
use crate::db::repositories::task_repository::{TaskRepository, TaskRow};
use crate::db::repositories::user_repository::UserRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::dashboard::{
    ChartData, DashboardTaskStats, OverallStats, RecentActivity, StatusShare,
    TaskCompletionReport, TaskCompletionStats, Timeframe, TrendPoint, UserDashboard,
};
use crate::models::event::{UpcomingEvent, UrgentEventRecord};
use crate::models::health::HealthRecord;
use crate::models::note::{NoteActivity, NoteRecord};
use crate::models::task::{
    TaskActivity, TaskRecord, STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_PENDING,
};
use crate::models::user::PublicUser;
use crate::services::event_service::is_upcoming;
use crate::services::require_user;
use crate::services::task_analytics::{analyze_task_patterns, parse_timestamp};
use crate::utils::rounding::percentage;

pub const DEFAULT_TREND_MONTHS: u32 = 6;
/// A century of monthly buckets.
pub const MAX_TREND_MONTHS: u32 = 1200;

const RECENT_TASKS: usize = 5;
const RECENT_NOTES: usize = 3;
const UPCOMING_EVENTS: usize = 5;

/// Everything one user owns, loaded in a single unit of work.
struct UserSnapshot {
    user: PublicUser,
    tasks: Vec<TaskRecord>,
    notes: Vec<NoteRecord>,
    events: Vec<UrgentEventRecord>,
    health: Vec<HealthRecord>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: DbPool,
    timezone: Tz,
}

impl DashboardService {
    pub fn new(db: DbPool, timezone: Tz) -> Self {
        Self { db, timezone }
    }

    pub fn user_dashboard(&self, user_id: &str, timeframe: Timeframe) -> AppResult<UserDashboard> {
        self.user_dashboard_at(user_id, timeframe, Utc::now())
    }

    pub fn user_dashboard_at(
        &self,
        user_id: &str,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> AppResult<UserDashboard> {
        let snapshot = self.load_snapshot(user_id)?;
        let since = timeframe_start(timeframe, now, &self.timezone);
        let in_frame = |created_at: &str| created_since(created_at, since);

        let framed_tasks = snapshot
            .tasks
            .iter()
            .filter(|task| in_frame(&task.created_at))
            .collect::<Vec<_>>();
        let task_stats = dashboard_task_stats(&framed_tasks);

        let overall_stats = OverallStats {
            total_notes: snapshot.notes.iter().filter(|n| in_frame(&n.created_at)).count(),
            total_urgent_events: snapshot
                .events
                .iter()
                .filter(|e| in_frame(&e.created_at))
                .count(),
            total_health_entries: snapshot
                .health
                .iter()
                .filter(|h| in_frame(&h.created_at))
                .count(),
        };

        let mut recent_tasks = snapshot.tasks.iter().collect::<Vec<_>>();
        recent_tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let mut recent_notes = snapshot.notes.iter().collect::<Vec<_>>();
        recent_notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let mut upcoming = snapshot
            .events
            .iter()
            .filter(|event| is_upcoming(event, now))
            .collect::<Vec<_>>();
        upcoming.sort_by(|a, b| a.event_date.cmp(&b.event_date));

        debug!(
            user_id = %user_id,
            timeframe = timeframe.as_str(),
            tasks = task_stats.total,
            "dashboard assembled"
        );

        Ok(UserDashboard {
            user: snapshot.user,
            timeframe,
            task_stats,
            overall_stats,
            recent_activity: RecentActivity {
                tasks: recent_tasks
                    .into_iter()
                    .take(RECENT_TASKS)
                    .map(TaskActivity::from)
                    .collect(),
                notes: recent_notes
                    .into_iter()
                    .take(RECENT_NOTES)
                    .map(NoteActivity::from)
                    .collect(),
            },
            upcoming_events: upcoming
                .into_iter()
                .take(UPCOMING_EVENTS)
                .map(UpcomingEvent::from)
                .collect(),
        })
    }

    pub fn task_completion_stats(
        &self,
        user_id: &str,
        timeframe: Timeframe,
    ) -> AppResult<TaskCompletionReport> {
        self.task_completion_stats_at(user_id, timeframe, Utc::now())
    }

    pub fn task_completion_stats_at(
        &self,
        user_id: &str,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> AppResult<TaskCompletionReport> {
        let tasks = self.load_tasks(user_id)?;
        let since = timeframe_start(timeframe, now, &self.timezone);
        let framed = tasks
            .iter()
            .filter(|task| created_since(&task.created_at, since))
            .collect::<Vec<_>>();

        let summary = dashboard_task_stats(&framed);
        let pending_percentage = percentage(summary.pending, summary.total);
        let in_progress_percentage = percentage(summary.in_progress, summary.total);

        Ok(TaskCompletionReport {
            timeframe,
            chart_data: ChartData {
                labels: vec!["Completed".into(), "Pending".into(), "In Progress".into()],
                data: vec![summary.completed, summary.pending, summary.in_progress],
                percentages: vec![
                    summary.completion_percentage,
                    pending_percentage,
                    in_progress_percentage,
                ],
            },
            stats: TaskCompletionStats {
                total_tasks: summary.total,
                completed_tasks: summary.completed,
                pending_tasks: summary.pending,
                in_progress_tasks: summary.in_progress,
                completion_percentage: summary.completion_percentage,
                pending_percentage,
                in_progress_percentage,
            },
        })
    }

    pub fn completion_trends(
        &self,
        user_id: &str,
        months: Option<u32>,
    ) -> AppResult<Vec<TrendPoint>> {
        self.completion_trends_at(user_id, months, Utc::now())
    }

    /// One point per calendar month in the configured zone, oldest first,
    /// ending with the month containing `now`.
    pub fn completion_trends_at(
        &self,
        user_id: &str,
        months: Option<u32>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<TrendPoint>> {
        let months = months.unwrap_or(DEFAULT_TREND_MONTHS);
        if months == 0 {
            return Err(AppError::validation("months must be at least 1"));
        }
        if months > MAX_TREND_MONTHS {
            return Err(AppError::validation(format!(
                "months must be at most {MAX_TREND_MONTHS}"
            )));
        }

        let tasks = self.load_tasks(user_id)?;
        let created = tasks
            .iter()
            .filter_map(|task| {
                parse_timestamp(&task.created_at)
                    .map(|at| (at, task.status == STATUS_COMPLETED))
            })
            .collect::<Vec<_>>();

        let local_today = now.with_timezone(&self.timezone).date_naive();
        let current_month = local_today.with_day(1).unwrap_or(local_today);

        let mut trends = Vec::new();
        for offset in (0..months).rev() {
            let Some(month_start) = current_month.checked_sub_months(Months::new(offset)) else {
                warn!(offset, "trend month out of calendar range");
                continue;
            };
            let next_month = month_start
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX);
            let start = local_midnight(&self.timezone, month_start);
            let end = local_midnight(&self.timezone, next_month);

            let in_month = created
                .iter()
                .filter(|(at, _)| *at >= start && *at < end)
                .collect::<Vec<_>>();
            let total_tasks = in_month.len();
            let completed_tasks = in_month.iter().filter(|(_, done)| *done).count();

            trends.push(TrendPoint {
                month: month_start.format("%B %Y").to_string(),
                month_key: month_start.format("%Y-%m").to_string(),
                total_tasks,
                completed_tasks,
                completion_rate: percentage(completed_tasks, total_tasks),
            });
        }

        debug!(user_id = %user_id, months, "completion trends computed");
        Ok(trends)
    }

    fn load_tasks(&self, user_id: &str) -> AppResult<Vec<TaskRecord>> {
        let rows = self.db.with_connection(|conn| {
            require_user(conn, user_id)?;
            TaskRepository::list_by_user(conn, user_id)
        })?;
        Ok(rows.into_iter().map(TaskRow::into_record).collect())
    }

    fn load_snapshot(&self, user_id: &str) -> AppResult<UserSnapshot> {
        let (user, tasks, notes, events, health) = self.db.with_connection(|conn| {
            let user = UserRepository::find_by_id(conn, user_id)?
                .ok_or_else(|| AppError::not_found("user"))?;
            let tasks = TaskRepository::list_by_user(conn, user_id)?;
            let notes = NoteRepository::list(
                conn,
                &NoteQuery {
                    user_id: Some(user_id.to_string()),
                    ..Default::default()
                },
            )?;
            let events = UrgentEventRepository::list(
                conn,
                &UrgentEventQuery {
                    user_id: Some(user_id.to_string()),
                    ..Default::default()
                },
            )?;
            let health = HealthRepository::list(
                conn,
                &HealthQuery {
                    user_id: Some(user_id.to_string()),
                    ..Default::default()
                },
            )?;
            Ok((user, tasks, notes, events, health))
        })?;

        Ok(UserSnapshot {
            user: PublicUser::from(&user.into_record()),
            tasks: tasks.into_iter().map(TaskRow::into_record).collect(),
            notes: notes
                .into_iter()
                .map(NoteRow::into_record)
                .collect::<AppResult<_>>()?,
            events: events
                .into_iter()
                .map(UrgentEventRow::into_record)
                .collect::<AppResult<_>>()?,
            health: health
                .into_iter()
                .map(HealthRow::into_record)
                .collect::<AppResult<_>>()?,
        })
    }
}

/// Lower bound on `createdAt` for a timeframe; `None` means no bound.
///
/// `week` is a rolling seven days. `month` and `year` step back one calendar
/// month or year from today's date in `tz` and start at local midnight; a day
/// that does not exist in the target month clamps to that month's last day.
pub fn timeframe_start(
    timeframe: Timeframe,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Option<DateTime<Utc>> {
    let local_today = now.with_timezone(tz).date_naive();
    match timeframe {
        Timeframe::Week => Some(now - Duration::days(7)),
        Timeframe::Month => local_today
            .checked_sub_months(Months::new(1))
            .map(|date| local_midnight(tz, date)),
        Timeframe::Year => local_today
            .checked_sub_months(Months::new(12))
            .map(|date| local_midnight(tz, date)),
        Timeframe::All => None,
    }
}

fn local_midnight(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn created_since(created_at: &str, since: Option<DateTime<Utc>>) -> bool {
    match since {
        Some(bound) => parse_timestamp(created_at).is_some_and(|at| at >= bound),
        None => true,
    }
}

fn dashboard_task_stats(tasks: &[&TaskRecord]) -> DashboardTaskStats {
    let patterns = analyze_task_patterns(tasks);
    let count = |status: &str| patterns.tasks_by_status.get(status).copied().unwrap_or(0);
    let total = patterns.total_tasks;
    let completed = count(STATUS_COMPLETED);
    let pending = count(STATUS_PENDING);
    let in_progress = count(STATUS_IN_PROGRESS);

    let share = |status: &str, n: usize| StatusShare {
        status: status.to_string(),
        count: n,
        percentage: percentage(n, total),
    };

    DashboardTaskStats {
        total,
        completed,
        pending,
        in_progress,
        completion_percentage: percentage(completed, total),
        status_distribution: vec![
            share(STATUS_COMPLETED, completed),
            share(STATUS_PENDING, pending),
            share(STATUS_IN_PROGRESS, in_progress),
        ],
    }
}
