use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskpulse_app_lib::db::DbPool;
use taskpulse_app_lib::error::AppError;
use taskpulse_app_lib::models::dashboard::Timeframe;
use taskpulse_app_lib::models::event::{EventPriority, UrgentEventCreateInput};
use taskpulse_app_lib::models::health::{HealthCreateInput, HealthData};
use taskpulse_app_lib::models::note::NoteCreateInput;
use taskpulse_app_lib::models::task::TaskCreateInput;
use taskpulse_app_lib::models::user::UserCreateInput;
use taskpulse_app_lib::services::dashboard_service::DashboardService;
use taskpulse_app_lib::services::event_service::EventService;
use taskpulse_app_lib::services::health_service::HealthService;
use taskpulse_app_lib::services::note_service::NoteService;
use taskpulse_app_lib::services::task_service::TaskService;
use taskpulse_app_lib::services::user_service::UserService;
use tempfile::{tempdir, TempDir};

struct Workspace {
    pool: DbPool,
    user_id: String,
    _dir: TempDir,
}

fn workspace(name: &str) -> Workspace {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join(format!("{name}.sqlite"))).expect("db pool");
    let user = UserService::new(pool.clone())
        .add_user(UserCreateInput {
            username: name.into(),
            password: "hunter22".into(),
            email: format!("{name}@example.com"),
        })
        .expect("user");
    Workspace {
        pool,
        user_id: user.id,
        _dir: dir,
    }
}

fn task(user_id: &str, title: &str, status: &str) -> TaskCreateInput {
    TaskCreateInput {
        title: title.into(),
        description: "dashboard fixture".into(),
        start_date: "2025-01-01".into(),
        due_date: "2025-12-31".into(),
        user_id: user_id.into(),
        status: Some(status.into()),
        estimated_time: None,
        actual_time: None,
    }
}

fn set_created_at(pool: &DbPool, id: &str, created_at: &str) {
    pool.with_connection(|conn| {
        conn.execute(
            "UPDATE tasks SET created_at = ?1 WHERE id = ?2",
            (created_at, id),
        )?;
        Ok(())
    })
    .expect("backdate task");
}

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("timestamp")
        .with_timezone(&Utc)
}

#[test]
fn dashboard_combines_every_collection() {
    let ws = workspace("overview");
    let tasks = TaskService::new(ws.pool.clone());
    let notes = NoteService::new(ws.pool.clone());
    let events = EventService::new(ws.pool.clone());
    let health = HealthService::new(ws.pool.clone());
    let dashboard = DashboardService::new(ws.pool.clone(), Tz::UTC);

    let statuses = ["completed", "completed", "pending", "pending", "in-progress", "pending"];
    for (index, status) in statuses.into_iter().enumerate() {
        tasks
            .register_task(task(&ws.user_id, &format!("Task {index}"), status))
            .expect("task");
    }

    for index in 0..4 {
        notes
            .create_note(NoteCreateInput {
                title: format!("Note {index}"),
                content: "remember this".into(),
                user_id: ws.user_id.clone(),
                ..Default::default()
            })
            .expect("note");
    }

    events
        .create_event(UrgentEventCreateInput {
            title: "Server outage drill".into(),
            description: "practice failover".into(),
            event_date: "2099-06-01".into(),
            event_time: "09:00".into(),
            priority: Some(EventPriority::Critical),
            user_id: ws.user_id.clone(),
            ..Default::default()
        })
        .expect("future event");
    events
        .create_event(UrgentEventCreateInput {
            title: "Past deadline".into(),
            description: "already gone".into(),
            event_date: "2001-01-01".into(),
            event_time: "09:00".into(),
            user_id: ws.user_id.clone(),
            ..Default::default()
        })
        .expect("past event");

    health
        .create_record(HealthCreateInput {
            title: "Morning pulse".into(),
            category: "vitals".into(),
            data: Some(HealthData {
                heart_rate: Some(62.0),
                ..Default::default()
            }),
            user_id: ws.user_id.clone(),
            ..Default::default()
        })
        .expect("health record");

    let view = dashboard
        .user_dashboard_at(&ws.user_id, Timeframe::All, Utc::now())
        .expect("dashboard");

    assert_eq!(view.user.username, "overview");
    assert_eq!(view.task_stats.total, 6);
    assert_eq!(view.task_stats.completed, 2);
    assert_eq!(view.task_stats.pending, 3);
    assert_eq!(view.task_stats.in_progress, 1);
    assert_eq!(view.task_stats.completion_percentage, 33);
    assert_eq!(view.overall_stats.total_notes, 4);
    assert_eq!(view.overall_stats.total_urgent_events, 2);
    assert_eq!(view.overall_stats.total_health_entries, 1);
    assert_eq!(view.recent_activity.tasks.len(), 5);
    assert_eq!(view.recent_activity.notes.len(), 3);
    assert_eq!(view.upcoming_events.len(), 1);
    assert_eq!(view.upcoming_events[0].title, "Server outage drill");
}

#[test]
fn timeframe_filters_on_creation_time() {
    let ws = workspace("framed");
    let tasks = TaskService::new(ws.pool.clone());
    let dashboard = DashboardService::new(ws.pool.clone(), Tz::UTC);

    let recent = tasks
        .register_task(task(&ws.user_id, "Recent", "completed"))
        .expect("recent task");
    let old = tasks
        .register_task(task(&ws.user_id, "Old", "pending"))
        .expect("old task");
    set_created_at(&ws.pool, &recent.id, "2025-03-28T10:00:00.000Z");
    set_created_at(&ws.pool, &old.id, "2024-11-02T10:00:00.000Z");

    let now = at("2025-03-31T12:00:00Z");

    let week = dashboard
        .task_completion_stats_at(&ws.user_id, Timeframe::Week, now)
        .expect("week stats");
    assert_eq!(week.stats.total_tasks, 1);
    assert_eq!(week.stats.completion_percentage, 100);
    assert_eq!(week.chart_data.labels, vec!["Completed", "Pending", "In Progress"]);
    assert_eq!(week.chart_data.data, vec![1, 0, 0]);

    let year = dashboard
        .task_completion_stats_at(&ws.user_id, Timeframe::Year, now)
        .expect("year stats");
    assert_eq!(year.stats.total_tasks, 2);
    assert_eq!(year.stats.pending_percentage, 50);
    assert_eq!(year.chart_data.percentages, vec![50, 50, 0]);
}

#[test]
fn trends_cover_whole_calendar_months() {
    let ws = workspace("trending");
    let tasks = TaskService::new(ws.pool.clone());
    let dashboard = DashboardService::new(ws.pool.clone(), Tz::UTC);

    for (title, status, created_at) in [
        ("January done", "completed", "2025-01-10T08:00:00.000Z"),
        ("March open", "pending", "2025-03-02T08:00:00.000Z"),
        ("March done", "completed", "2025-03-05T08:00:00.000Z"),
        ("Too old", "completed", "2024-12-31T23:59:59.000Z"),
    ] {
        let created = tasks
            .register_task(task(&ws.user_id, title, status))
            .expect("task");
        set_created_at(&ws.pool, &created.id, created_at);
    }

    let trends = dashboard
        .completion_trends_at(&ws.user_id, Some(3), at("2025-03-15T12:00:00Z"))
        .expect("trends");

    let keys = trends.iter().map(|p| p.month_key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["2025-01", "2025-02", "2025-03"]);
    assert_eq!(trends[0].month, "January 2025");
    assert_eq!((trends[0].total_tasks, trends[0].completion_rate), (1, 100));
    assert_eq!((trends[1].total_tasks, trends[1].completion_rate), (0, 0));
    assert_eq!(trends[2].total_tasks, 2);
    assert_eq!(trends[2].completed_tasks, 1);
    assert_eq!(trends[2].completion_rate, 50);

    let err = dashboard
        .completion_trends_at(&ws.user_id, Some(0), at("2025-03-15T12:00:00Z"))
        .expect_err("zero months");
    assert!(err.to_string().contains("months"));

    let err = dashboard
        .completion_trends_at(&ws.user_id, Some(u32::MAX), at("2025-03-15T12:00:00Z"))
        .expect_err("unbounded months");
    assert!(matches!(err, AppError::Validation { .. }));
}

#[test]
fn unknown_user_is_not_found() {
    let ws = workspace("ghosted");
    let dashboard = DashboardService::new(ws.pool.clone(), Tz::UTC);
    let err = dashboard
        .user_dashboard("missing-user", Timeframe::Month)
        .expect_err("missing user");
    assert!(err.is_not_found());
}
