use chrono_tz::Tz;
use serde_json::json;
use taskpulse_app_lib::db::DbPool;
use taskpulse_app_lib::models::analytics::{
    CompletionTimeOutcome, ProductivityOutcome, TimingCategory,
};
use taskpulse_app_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use taskpulse_app_lib::models::user::UserCreateInput;
use taskpulse_app_lib::services::analysis_service::AnalysisService;
use taskpulse_app_lib::services::task_service::TaskService;
use taskpulse_app_lib::services::user_service::UserService;
use tempfile::tempdir;

fn timed_task(user_id: &str, title: &str, estimated: f64, actual: f64) -> TaskCreateInput {
    TaskCreateInput {
        title: title.into(),
        description: "tracked work".into(),
        start_date: "2025-04-01".into(),
        due_date: "2025-04-10".into(),
        user_id: user_id.into(),
        status: None,
        estimated_time: Some(estimated),
        actual_time: Some(actual),
    }
}

#[test]
fn stored_tasks_flow_through_every_analyzer() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("analytics.sqlite")).expect("db pool");

    let users = UserService::new(pool.clone());
    let tasks = TaskService::new(pool.clone());
    let analysis = AnalysisService::new(pool.clone(), Tz::UTC);

    let user = users
        .add_user(UserCreateInput {
            username: "analyst".into(),
            password: "hunter22".into(),
            email: "analyst@example.com".into(),
        })
        .expect("user");

    let early = tasks
        .register_task(timed_task(&user.id, "Write report", 60.0, 45.0))
        .expect("early task");
    tasks
        .register_task(timed_task(&user.id, "Review PR", 30.0, 30.0))
        .expect("on-time task");
    let late = tasks
        .register_task(timed_task(&user.id, "Migrate DB", 20.0, 50.0))
        .expect("late task");

    for id in [&early.id, &late.id] {
        tasks
            .update_task(
                id,
                TaskUpdateInput {
                    status: Some("completed".into()),
                    ..Default::default()
                },
            )
            .expect("complete task");
    }

    let patterns = analysis
        .analyze_tasks(Some(&user.id), None)
        .expect("patterns");
    assert_eq!(patterns.total_tasks, 3);
    assert_eq!(patterns.completed_tasks, 2);
    assert_eq!(patterns.tasks_by_status.get("pending"), Some(&1));

    let report = analysis
        .productivity(&user.id, None, None)
        .expect("productivity");
    assert_eq!(report.date_range.start, "all time");
    let summary = report.analysis.summary().expect("summary");
    assert_eq!(summary.total_completed_tasks, 2);
    assert_eq!(summary.productivity_by_day.values().sum::<usize>(), 2);

    let times = analysis.completion_times(&user.id).expect("completion times");
    let summary = times.summary().expect("timing summary");
    assert_eq!(summary.analyzed_tasks, 3);
    assert_eq!(summary.categorization.get(&TimingCategory::Early), Some(&1));
    assert_eq!(summary.categorization.get(&TimingCategory::OnTime), Some(&1));
    assert_eq!(summary.categorization.get(&TimingCategory::Delayed), Some(&1));
    assert_eq!(summary.average_time_difference, 5.0);

    let full = analysis.full_analysis(&user.id).expect("full analysis");
    assert_eq!(full.user, user.id);
    assert_eq!(full.total_tasks, 3);
    assert!(matches!(full.stats.productivity, ProductivityOutcome::Summary(_)));
    assert!(matches!(
        full.stats.completion_times,
        CompletionTimeOutcome::Summary(_)
    ));
}

#[test]
fn productivity_window_excludes_tasks_outside_the_bounds() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("window.sqlite")).expect("db pool");
    let users = UserService::new(pool.clone());
    let tasks = TaskService::new(pool.clone());
    let analysis = AnalysisService::new(pool.clone(), Tz::UTC);

    let user = users
        .add_user(UserCreateInput {
            username: "windowed".into(),
            password: "hunter22".into(),
            email: "windowed@example.com".into(),
        })
        .expect("user");
    let mut input = timed_task(&user.id, "Old work", 10.0, 10.0);
    input.status = Some("completed".into());
    tasks.register_task(input).expect("completed task");

    // Completed just now, so a window that closed in 2020 holds nothing.
    let err = analysis
        .productivity(&user.id, Some("2020-01-01"), Some("2020-12-31"))
        .expect_err("empty window");
    assert!(err.is_not_found());

    let report = analysis
        .productivity(&user.id, Some("2020-01-01"), None)
        .expect("open-ended window");
    assert_eq!(report.date_range.start, "2020-01-01");
    assert_eq!(report.date_range.end, "all time");
}

#[test]
fn payload_analysis_reports_invalid_shapes() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("payload.sqlite")).expect("db pool");
    let analysis = AnalysisService::new(pool, Tz::UTC);

    let summary = analysis
        .analyze_tasks(
            None,
            Some(&json!([
                { "status": "completed" },
                { "status": "pending" },
                {}
            ])),
        )
        .expect("payload patterns");
    assert_eq!(summary.total_tasks, 3);
    assert_eq!(summary.tasks_by_status.get("undefined"), Some(&1));

    let summary = analysis
        .analyze_tasks(None, Some(&json!([{ "status": "pending", "estimatedTime": "30" }])))
        .expect("numeric string estimate");
    assert_eq!(summary.tasks_by_status.get("pending"), Some(&1));

    let summary = analysis
        .analyze_tasks(
            None,
            Some(&json!([{ "status": "pending", "updatedAt": 1735725600000_i64 }])),
        )
        .expect("epoch millisecond timestamp");
    assert_eq!(summary.total_tasks, 1);

    let err = analysis
        .analyze_tasks(None, Some(&json!({ "status": "completed" })))
        .expect_err("object payload");
    assert!(err.to_string().contains("Invalid tasks data"));

    let err = analysis.analyze_tasks(None, None).expect_err("nothing given");
    assert!(err.to_string().contains("No tasks or user ID provided"));
}
