use serde::Serialize;

use crate::models::dashboard::{TaskCompletionReport, Timeframe, TrendPoint, UserDashboard};

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub message: String,
    #[serde(flatten)]
    pub dashboard: UserDashboard,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: TaskCompletionReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsResponse {
    pub message: String,
    pub trends: Vec<TrendPoint>,
}

pub async fn dashboard_user(
    state: &AppState,
    user_id: String,
    timeframe: Option<String>,
) -> CommandResult<DashboardResponse> {
    let app_state = state.clone();
    let timeframe = Timeframe::parse_lenient(timeframe.as_deref());
    let dashboard =
        run_blocking(move || app_state.dashboard().user_dashboard(&user_id, timeframe)).await?;
    Ok(DashboardResponse {
        message: "Dashboard data retrieved successfully".to_string(),
        dashboard,
    })
}

pub async fn dashboard_task_stats(
    state: &AppState,
    user_id: String,
    timeframe: Option<String>,
) -> CommandResult<TaskCompletionResponse> {
    let app_state = state.clone();
    let timeframe = Timeframe::parse_lenient(timeframe.as_deref());
    let report = run_blocking(move || {
        app_state
            .dashboard()
            .task_completion_stats(&user_id, timeframe)
    })
    .await?;
    Ok(TaskCompletionResponse {
        message: "Task completion statistics retrieved successfully".to_string(),
        report,
    })
}

pub async fn dashboard_trends(
    state: &AppState,
    user_id: String,
    months: Option<u32>,
) -> CommandResult<TrendsResponse> {
    let app_state = state.clone();
    let trends =
        run_blocking(move || app_state.dashboard().completion_trends(&user_id, months)).await?;
    Ok(TrendsResponse {
        message: "Task completion trends retrieved successfully".to_string(),
        trends,
    })
}
