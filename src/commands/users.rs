use serde::{Deserialize, Serialize};

use crate::models::task::TaskRecord;
use crate::models::user::{PublicUser, UserCreateInput, UserTaskStats, UserUpdateInput};

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserCheckPayload {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub message: String,
    pub count: usize,
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTasksResponse {
    pub message: String,
    pub user: PublicUser,
    pub tasks_count: usize,
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeleteResponse {
    pub message: String,
    pub deleted_tasks_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub message: String,
    pub user: PublicUser,
    pub stats: UserTaskStats,
}

fn user_response(message: &str, user: PublicUser) -> UserResponse {
    UserResponse {
        message: message.to_string(),
        user,
    }
}

pub async fn users_add(state: &AppState, payload: UserCreateInput) -> CommandResult<UserResponse> {
    let app_state = state.clone();
    let user = run_blocking(move || app_state.users().add_user(payload)).await?;
    Ok(user_response("User registered successfully", user))
}

pub async fn users_check(
    state: &AppState,
    payload: UserCheckPayload,
) -> CommandResult<UserResponse> {
    let app_state = state.clone();
    let user = run_blocking(move || {
        app_state
            .users()
            .check_user(&payload.username, payload.password.as_deref())
    })
    .await?;
    Ok(user_response("User exists", user))
}

pub async fn users_list(state: &AppState) -> CommandResult<UserListResponse> {
    let app_state = state.clone();
    let users = run_blocking(move || app_state.users().list_users()).await?;
    Ok(UserListResponse {
        message: "Users retrieved successfully".to_string(),
        count: users.len(),
        users,
    })
}

pub async fn users_get(state: &AppState, user_id: String) -> CommandResult<UserResponse> {
    let app_state = state.clone();
    let user = run_blocking(move || app_state.users().get_user(&user_id)).await?;
    Ok(user_response("User retrieved successfully", user))
}

pub async fn users_get_with_tasks(
    state: &AppState,
    user_id: String,
) -> CommandResult<UserWithTasksResponse> {
    let app_state = state.clone();
    let found = run_blocking(move || app_state.users().get_user_with_tasks(&user_id)).await?;
    Ok(UserWithTasksResponse {
        message: "User with tasks retrieved successfully".to_string(),
        user: found.user,
        tasks_count: found.tasks_count,
        tasks: found.tasks,
    })
}

pub async fn users_update(
    state: &AppState,
    user_id: String,
    payload: UserUpdateInput,
) -> CommandResult<UserResponse> {
    let app_state = state.clone();
    let user = run_blocking(move || app_state.users().update_user(&user_id, payload)).await?;
    Ok(user_response("User updated successfully", user))
}

pub async fn users_delete(state: &AppState, user_id: String) -> CommandResult<UserDeleteResponse> {
    let app_state = state.clone();
    let deleted_tasks_count =
        run_blocking(move || app_state.users().delete_user(&user_id)).await?;
    Ok(UserDeleteResponse {
        message: "User and associated tasks deleted successfully".to_string(),
        deleted_tasks_count,
    })
}

pub async fn users_stats(state: &AppState, user_id: String) -> CommandResult<UserStatsResponse> {
    let app_state = state.clone();
    let (user, stats) = run_blocking(move || {
        let users = app_state.users();
        let user = users.get_user(&user_id)?;
        let stats = users.user_stats(&user_id)?;
        Ok((user, stats))
    })
    .await?;
    Ok(UserStatsResponse {
        message: "User statistics retrieved successfully".to_string(),
        user,
        stats,
    })
}
