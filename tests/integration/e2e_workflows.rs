// End-to-end workflow integration tests
// Drive a user's whole lifecycle through the command layer

use chrono_tz::Tz;
use serde_json::json;
use taskpulse_app_lib::commands::{
    analytics, dashboard, events, health, notes, tasks, users, AppState,
};
use taskpulse_app_lib::db::DbPool;
use taskpulse_app_lib::models::event::{EventPriority, UrgentEventCreateInput, UrgentEventFilters};
use taskpulse_app_lib::models::health::{HealthCreateInput, HealthData, HealthFilters};
use taskpulse_app_lib::models::note::{NoteCreateInput, NoteListFilters};
use taskpulse_app_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use taskpulse_app_lib::models::user::UserCreateInput;
use tempfile::tempdir;

fn setup_test_environment() -> (AppState, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("e2e.sqlite")).expect("db pool");
    (AppState::new(pool, Tz::UTC), dir)
}

#[tokio::test]
async fn test_user_lifecycle_workflow() {
    let (state, _dir) = setup_test_environment();

    let registered = users::users_add(
        &state,
        UserCreateInput {
            username: "jordan".into(),
            password: "correct horse".into(),
            email: "Jordan@Example.com".into(),
        },
    )
    .await
    .expect("register");
    let user_id = registered.user.id.clone();
    assert_eq!(registered.message, "User registered successfully");

    // Tasks
    let mut task_ids = Vec::new();
    let plan = [("Plan sprint", 60.0, 50.0), ("Ship release", 120.0, 150.0)];
    for (title, estimated, actual) in plan {
        let created = tasks::tasks_register(
            &state,
            TaskCreateInput {
                title: title.into(),
                description: "sprint work".into(),
                start_date: "2025-06-02".into(),
                due_date: "2025-06-13".into(),
                user_id: user_id.clone(),
                estimated_time: Some(estimated),
                actual_time: Some(actual),
                ..Default::default()
            },
        )
        .await
        .expect("register task");
        task_ids.push(created.task.id);
    }
    tasks::tasks_update(
        &state,
        task_ids[0].clone(),
        TaskUpdateInput {
            status: Some("completed".into()),
            ..Default::default()
        },
    )
    .await
    .expect("complete task");

    let listed = tasks::tasks_list_by_user(&state, user_id.clone())
        .await
        .expect("list tasks");
    assert_eq!(listed.message, "Tasks for user jordan");
    assert_eq!(listed.count, 2);

    // Notes
    let note = notes::notes_create(
        &state,
        NoteCreateInput {
            title: "Retro ideas".into(),
            content: "Fewer meetings".into(),
            category: Some("work".into()),
            tags: Some(vec!["Retro".into()]),
            user_id: user_id.clone(),
            ..Default::default()
        },
    )
    .await
    .expect("create note");
    let pinned = notes::notes_toggle_pin(&state, note.note.id.clone())
        .await
        .expect("pin note");
    assert_eq!(pinned.message, "Note pinned successfully");
    let found = notes::notes_list_by_user(
        &state,
        user_id.clone(),
        Some(NoteListFilters {
            search: Some("RETRO".into()),
            ..Default::default()
        }),
    )
    .await
    .expect("search notes");
    assert_eq!(found.count, 1);

    // Urgent events
    events::events_create(
        &state,
        UrgentEventCreateInput {
            title: "Contract renewal".into(),
            description: "sign before expiry".into(),
            event_date: "2099-02-01".into(),
            event_time: "14:00".into(),
            priority: Some(EventPriority::Critical),
            user_id: user_id.clone(),
            ..Default::default()
        },
    )
    .await
    .expect("create event");
    let upcoming = events::events_list_by_user(
        &state,
        user_id.clone(),
        Some(UrgentEventFilters {
            upcoming: Some(true),
            ..Default::default()
        }),
    )
    .await
    .expect("upcoming events");
    assert_eq!(upcoming.count, 1);
    let event_stats = events::events_stats(&state, user_id.clone())
        .await
        .expect("event stats");
    assert_eq!(event_stats.stats.critical_events, 1);

    // Health
    health::health_create(
        &state,
        HealthCreateInput {
            title: "Evening run".into(),
            category: "exercise".into(),
            data: Some(HealthData {
                exercise_type: Some("running".into()),
                duration: Some(35.0),
                ..Default::default()
            }),
            user_id: user_id.clone(),
            ..Default::default()
        },
    )
    .await
    .expect("create health record");
    let exercise = health::health_list_by_user(
        &state,
        user_id.clone(),
        Some(HealthFilters {
            category: Some("exercise".into()),
            ..Default::default()
        }),
    )
    .await
    .expect("list health");
    assert_eq!(exercise.count, 1);
    assert!(exercise.health_data[0].is_private);

    // Dashboard and analytics
    let overview = dashboard::dashboard_user(&state, user_id.clone(), Some("week".into()))
        .await
        .expect("dashboard");
    assert_eq!(overview.dashboard.task_stats.total, 2);
    assert_eq!(overview.dashboard.task_stats.completion_percentage, 50);
    assert_eq!(overview.dashboard.upcoming_events.len(), 1);

    let timing = analytics::analytics_completion_times(&state, user_id.clone())
        .await
        .expect("completion times");
    let summary = timing.analysis.summary().expect("timing summary");
    assert_eq!(summary.average_time_difference, 10.0);

    let full = analytics::analytics_full(&state, user_id.clone())
        .await
        .expect("full analysis");
    let body = serde_json::to_value(&full).expect("serialize");
    assert_eq!(body["totalTasks"], json!(2));
    assert_eq!(body["stats"]["patterns"]["completedTasks"], json!(1));

    // Deleting the user takes everything it owns along
    let deleted = users::users_delete(&state, user_id.clone())
        .await
        .expect("delete user");
    assert_eq!(deleted.deleted_tasks_count, 2);

    let remaining_notes = notes::notes_list(&state, None).await.expect("notes");
    assert_eq!(remaining_notes.count, 0);
    let remaining_events = events::events_list(&state, None).await.expect("events");
    assert_eq!(remaining_events.count, 0);
    let remaining_health = health::health_list(&state, None).await.expect("health");
    assert_eq!(remaining_health.count, 0);

    let err = users::users_get(&state, user_id).await.expect_err("gone");
    assert_eq!(err.http_status(), 404);
    assert_eq!(err.message, "User not found");
}

#[tokio::test]
async fn test_payload_inspection_needs_no_storage() {
    let (state, _dir) = setup_test_environment();

    let tasks = json!([
        {
            "status": "completed",
            "updatedAt": "2025-06-02T10:00:00Z",
            "estimatedTime": 30,
            "actualTime": 20
        },
        { "status": "completed", "updatedAt": "2025-06-09T10:00:00Z" },
        { "status": "pending", "createdAt": "2025-06-03T08:00:00Z" }
    ]);

    let report = analytics::analytics_inspect(&state, tasks)
        .await
        .expect("inspect payload");
    assert_eq!(report.patterns.total_tasks, 3);
    let productivity = report.productivity.summary().expect("productivity");
    assert_eq!(productivity.total_completed_tasks, 2);
    assert_eq!(productivity.total_pending_tasks, 1);
    assert_eq!(productivity.productivity_by_day.get("Monday"), Some(&2));
    let timing = report.completion_times.summary().expect("timing");
    assert_eq!(timing.analyzed_tasks, 1);
    assert_eq!(timing.average_time_difference, -10.0);
}
