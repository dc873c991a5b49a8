use serde::Serialize;

use crate::models::task::{TaskCreateInput, TaskRecord, TaskUpdateInput};

use super::{run_blocking, AppState, CommandResult, MessageResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub message: String,
    pub task: TaskRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub message: String,
    pub count: usize,
    pub tasks: Vec<TaskRecord>,
}

pub async fn tasks_register(
    state: &AppState,
    payload: TaskCreateInput,
) -> CommandResult<TaskResponse> {
    let app_state = state.clone();
    let task = run_blocking(move || app_state.tasks().register_task(payload)).await?;
    Ok(TaskResponse {
        message: "Task registered successfully".to_string(),
        task,
    })
}

/// Every task, or only those of `user_id` when given.
pub async fn tasks_list(
    state: &AppState,
    user_id: Option<String>,
) -> CommandResult<TaskListResponse> {
    let app_state = state.clone();
    let tasks = run_blocking(move || app_state.tasks().list_tasks(user_id.as_deref())).await?;
    Ok(TaskListResponse {
        message: "Tasks retrieved successfully".to_string(),
        count: tasks.len(),
        tasks,
    })
}

pub async fn tasks_list_by_user(
    state: &AppState,
    user_id: String,
) -> CommandResult<TaskListResponse> {
    let app_state = state.clone();
    let (username, tasks) = run_blocking(move || {
        let user = app_state.users().get_user(&user_id)?;
        let tasks = app_state.tasks().list_tasks_by_user(&user_id)?;
        Ok((user.username, tasks))
    })
    .await?;
    Ok(TaskListResponse {
        message: format!("Tasks for user {username}"),
        count: tasks.len(),
        tasks,
    })
}

pub async fn tasks_update(
    state: &AppState,
    id: String,
    payload: TaskUpdateInput,
) -> CommandResult<TaskResponse> {
    let app_state = state.clone();
    let task = run_blocking(move || app_state.tasks().update_task(&id, payload)).await?;
    Ok(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    })
}

pub async fn tasks_delete(state: &AppState, id: String) -> CommandResult<MessageResponse> {
    let app_state = state.clone();
    run_blocking(move || app_state.tasks().delete_task(&id)).await?;
    Ok(MessageResponse::new("Task deleted successfully"))
}
