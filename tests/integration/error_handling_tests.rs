// Error handling and edge case tests

use serde_json::json;
use taskpulse_app_lib::db::DbPool;
use taskpulse_app_lib::error::AppError;
use taskpulse_app_lib::models::event::UrgentEventCreateInput;
use taskpulse_app_lib::models::health::{HealthCreateInput, HealthData};
use taskpulse_app_lib::models::note::NoteCreateInput;
use taskpulse_app_lib::models::task::TaskCreateInput;
use taskpulse_app_lib::models::user::{UserCreateInput, UserUpdateInput};
use taskpulse_app_lib::services::event_service::EventService;
use taskpulse_app_lib::services::health_service::HealthService;
use taskpulse_app_lib::services::note_service::NoteService;
use taskpulse_app_lib::services::task_service::TaskService;
use taskpulse_app_lib::services::user_service::UserService;
use tempfile::tempdir;

fn setup_test_environment() -> (DbPool, UserService, String, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("errors.sqlite")).expect("db pool");
    let users = UserService::new(pool.clone());
    let user = users
        .add_user(UserCreateInput {
            username: "careful".into(),
            password: "hunter22".into(),
            email: "careful@example.com".into(),
        })
        .expect("user");
    (pool, users, user.id, dir)
}

fn is_validation(err: &AppError) -> bool {
    matches!(err, AppError::Validation { .. })
}

#[test]
fn duplicate_users_conflict() {
    let (_pool, users, _user_id, _dir) = setup_test_environment();

    let err = users
        .add_user(UserCreateInput {
            username: "careful".into(),
            password: "another".into(),
            email: "new@example.com".into(),
        })
        .expect_err("same username");
    assert!(matches!(err, AppError::Conflict { .. }));

    let other = users
        .add_user(UserCreateInput {
            username: "other".into(),
            password: "another".into(),
            email: "other@example.com".into(),
        })
        .expect("second user");
    let err = users
        .update_user(
            &other.id,
            UserUpdateInput {
                email: Some("careful@example.com".into()),
                ..Default::default()
            },
        )
        .expect_err("taken email");
    assert!(matches!(err, AppError::Conflict { .. }));
}

#[test]
fn missing_required_fields_are_rejected() {
    let (pool, users, user_id, _dir) = setup_test_environment();

    let err = users
        .add_user(UserCreateInput {
            username: "lonely".into(),
            ..Default::default()
        })
        .expect_err("missing password and email");
    assert!(err.to_string().contains("Please fill all the fields"));

    let err = TaskService::new(pool.clone())
        .register_task(TaskCreateInput {
            title: "No dates".into(),
            user_id: user_id.clone(),
            ..Default::default()
        })
        .expect_err("missing dates");
    assert!(err.to_string().contains("including userId"));

    let err = EventService::new(pool.clone())
        .create_event(UrgentEventCreateInput {
            title: "No time".into(),
            description: "soon".into(),
            event_date: "2030-01-01".into(),
            user_id: user_id.clone(),
            ..Default::default()
        })
        .expect_err("missing event time");
    assert!(is_validation(&err));

    let err = NoteService::new(pool)
        .create_note(NoteCreateInput {
            title: "".into(),
            content: "body".into(),
            user_id,
            ..Default::default()
        })
        .expect_err("missing title");
    assert!(is_validation(&err));
}

#[test]
fn malformed_task_values_are_rejected() {
    let (pool, _users, user_id, _dir) = setup_test_environment();
    let tasks = TaskService::new(pool);
    let base = TaskCreateInput {
        title: "Shape check".into(),
        description: "bad values".into(),
        start_date: "2025-05-10".into(),
        due_date: "2025-05-12".into(),
        user_id,
        ..Default::default()
    };

    let err = tasks
        .register_task(TaskCreateInput {
            status: Some("archived".into()),
            ..base.clone()
        })
        .expect_err("unknown status");
    match err {
        AppError::Validation { details, .. } => {
            assert_eq!(details, Some(json!({ "field": "status", "value": "archived" })));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = tasks
        .register_task(TaskCreateInput {
            due_date: "2025-05-01".into(),
            ..base.clone()
        })
        .expect_err("due before start");
    assert!(err.to_string().contains("earlier than startDate"));

    let err = tasks
        .register_task(TaskCreateInput {
            start_date: "next tuesday".into(),
            ..base.clone()
        })
        .expect_err("unparseable date");
    assert!(is_validation(&err));

    let err = tasks
        .register_task(TaskCreateInput {
            actual_time: Some(-5.0),
            ..base
        })
        .expect_err("negative duration");
    assert!(is_validation(&err));
}

#[test]
fn records_for_unknown_users_are_not_found() {
    let (pool, _users, _user_id, _dir) = setup_test_environment();

    let err = HealthService::new(pool.clone())
        .create_record(HealthCreateInput {
            title: "Orphan".into(),
            category: "vitals".into(),
            user_id: "ghost".into(),
            ..Default::default()
        })
        .expect_err("unknown owner");
    assert!(err.is_not_found());

    let err = TaskService::new(pool)
        .register_task(TaskCreateInput {
            title: "Orphan".into(),
            description: "nobody owns this".into(),
            start_date: "2025-05-01".into(),
            due_date: "2025-05-02".into(),
            user_id: "ghost".into(),
            ..Default::default()
        })
        .expect_err("unknown owner");
    assert!(err.is_not_found());
}

#[test]
fn health_values_are_checked_per_field() {
    let (pool, _users, user_id, _dir) = setup_test_environment();
    let health = HealthService::new(pool);

    let err = health
        .create_record(HealthCreateInput {
            title: "Mystery".into(),
            category: "astrology".into(),
            user_id: user_id.clone(),
            ..Default::default()
        })
        .expect_err("unknown category");
    assert!(is_validation(&err));

    let err = health
        .create_record(HealthCreateInput {
            title: "Headache".into(),
            category: "symptom".into(),
            data: Some(HealthData {
                severity: Some("unbearable".into()),
                ..Default::default()
            }),
            user_id,
            ..Default::default()
        })
        .expect_err("unknown severity");
    assert!(is_validation(&err));
}

#[test]
fn wrong_password_fails_the_check() {
    let (_pool, users, _user_id, _dir) = setup_test_environment();

    assert!(users.check_user("careful", Some("hunter22")).is_ok());
    assert!(users.check_user("careful", None).is_ok());
    let err = users
        .check_user("careful", Some("wrong"))
        .expect_err("bad password");
    assert!(is_validation(&err));
    assert!(users
        .check_user("stranger", None)
        .expect_err("unknown user")
        .is_not_found());
}
