use taskpulse_app_lib::db::DbPool;
use taskpulse_app_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use taskpulse_app_lib::models::user::UserCreateInput;
use taskpulse_app_lib::services::task_service::TaskService;
use taskpulse_app_lib::services::user_service::UserService;
use tempfile::tempdir;

fn register_user(pool: &DbPool, name: &str) -> String {
    UserService::new(pool.clone())
        .add_user(UserCreateInput {
            username: name.into(),
            password: "hunter22".into(),
            email: format!("{name}@example.com"),
        })
        .expect("user")
        .id
}

#[test]
fn task_crud_flow() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("integration.sqlite")).expect("db pool");
    let user_id = register_user(&pool, "crud");
    let service = TaskService::new(pool.clone());

    // create
    let created = service
        .register_task(TaskCreateInput {
            title: "Integration Task".into(),
            description: "exercise every operation".into(),
            start_date: "2025-05-01".into(),
            due_date: "2025-05-03T17:30:00+02:00".into(),
            user_id: user_id.clone(),
            estimated_time: Some(0.0),
            ..Default::default()
        })
        .expect("register task");

    assert!(!created.id.is_empty());
    assert_eq!(created.status, "pending");
    assert_eq!(created.start_date, "2025-05-01T00:00:00.000Z");
    assert_eq!(created.due_date, "2025-05-03T15:30:00.000Z");
    assert_eq!(created.estimated_time, Some(0.0));
    assert!(created.completed_at.is_none());

    // list
    assert_eq!(service.list_tasks(None).expect("all tasks").len(), 1);
    assert_eq!(
        service
            .list_tasks_by_user(&user_id)
            .expect("user tasks")
            .len(),
        1
    );

    // update
    let updated = service
        .update_task(
            &created.id,
            TaskUpdateInput {
                title: Some("   ".into()),
                status: Some("completed".into()),
                actual_time: Some(Some(25.0)),
                ..Default::default()
            },
        )
        .expect("update task");
    assert_eq!(updated.title, "Integration Task");
    assert_eq!(updated.status, "completed");
    assert_eq!(updated.actual_time, Some(25.0));
    assert!(updated.completed_at.is_some());

    let cleared = service
        .update_task(
            &created.id,
            TaskUpdateInput {
                estimated_time: Some(None),
                ..Default::default()
            },
        )
        .expect("clear estimate");
    assert!(cleared.estimated_time.is_none());
    assert_eq!(cleared.completed_at, updated.completed_at);

    // delete
    service.delete_task(&created.id).expect("delete task");
    let err = service.get_task(&created.id).expect_err("deleted");
    assert!(err.is_not_found());
}

#[test]
fn tasks_are_scoped_to_their_owner() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("scoped.sqlite")).expect("db pool");
    let alice = register_user(&pool, "alice");
    let bob = register_user(&pool, "bob");
    let service = TaskService::new(pool.clone());

    for (owner, title) in [(&alice, "Alpha"), (&alice, "Beta"), (&bob, "Gamma")] {
        service
            .register_task(TaskCreateInput {
                title: title.into(),
                description: "owned".into(),
                start_date: "2025-05-01".into(),
                due_date: "2025-05-02".into(),
                user_id: owner.clone(),
                ..Default::default()
            })
            .expect("task");
    }

    assert_eq!(service.list_tasks(Some(&alice)).expect("alice").len(), 2);
    assert_eq!(service.list_tasks(Some(&bob)).expect("bob").len(), 1);
    assert_eq!(service.list_tasks(None).expect("everyone").len(), 3);
    assert!(service
        .list_tasks(Some("nobody"))
        .expect("unknown owner")
        .is_empty());
    assert!(service
        .list_tasks_by_user("nobody")
        .expect_err("unknown owner")
        .is_not_found());
}
