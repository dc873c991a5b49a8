use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::models::analytics::{
    CompletionTimeOutcome, FullAnalysisReport, PatternSummary, ProductivityOutcome,
    ProductivityReport,
};
use crate::services::task_analytics::{
    analyze_completion_time_payload, analyze_productivity_payload, analyze_task_patterns_payload,
};

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: PatternSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: ProductivityReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionTimeResponse {
    pub message: String,
    #[serde(flatten)]
    pub analysis: CompletionTimeOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullAnalysisResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: FullAnalysisReport,
}

/// Every analyzer run over a caller-supplied task array.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAnalysisResponse {
    pub message: String,
    pub patterns: PatternSummary,
    pub productivity: ProductivityOutcome,
    pub completion_times: CompletionTimeOutcome,
}

pub async fn analytics_analyze_tasks(
    state: &AppState,
    user_id: Option<String>,
    tasks: Option<JsonValue>,
) -> CommandResult<PatternResponse> {
    let app_state = state.clone();
    let summary = run_blocking(move || {
        app_state
            .analysis()
            .analyze_tasks(user_id.as_deref(), tasks.as_ref())
    })
    .await?;
    Ok(PatternResponse {
        message: "Task patterns analysed successfully".to_string(),
        summary,
    })
}

pub async fn analytics_productivity(
    state: &AppState,
    user_id: String,
    start_date: Option<String>,
    end_date: Option<String>,
) -> CommandResult<ProductivityResponse> {
    let app_state = state.clone();
    let report = run_blocking(move || {
        app_state
            .analysis()
            .productivity(&user_id, start_date.as_deref(), end_date.as_deref())
    })
    .await?;
    Ok(ProductivityResponse {
        message: "Productivity analysis completed".to_string(),
        report,
    })
}

pub async fn analytics_completion_times(
    state: &AppState,
    user_id: String,
) -> CommandResult<CompletionTimeResponse> {
    let app_state = state.clone();
    let analysis = run_blocking(move || app_state.analysis().completion_times(&user_id)).await?;
    Ok(CompletionTimeResponse {
        message: "Task completion time analysis".to_string(),
        analysis,
    })
}

pub async fn analytics_full(
    state: &AppState,
    user_id: String,
) -> CommandResult<FullAnalysisResponse> {
    let app_state = state.clone();
    let report = run_blocking(move || app_state.analysis().full_analysis(&user_id)).await?;
    Ok(FullAnalysisResponse {
        message: "Full analysis report generated".to_string(),
        report,
    })
}

/// Runs the analyzers over `tasks` without touching storage.
pub async fn analytics_inspect(
    state: &AppState,
    tasks: JsonValue,
) -> CommandResult<PayloadAnalysisResponse> {
    let timezone = state.timezone();
    let (patterns, productivity, completion_times) = run_blocking(move || {
        let patterns = analyze_task_patterns_payload(Some(&tasks))?;
        let productivity = analyze_productivity_payload(Some(&tasks), &timezone)?;
        let completion_times = analyze_completion_time_payload(Some(&tasks))?;
        Ok((patterns, productivity, completion_times))
    })
    .await?;
    Ok(PayloadAnalysisResponse {
        message: "Task payload analysed successfully".to_string(),
        patterns,
        productivity,
        completion_times,
    })
}
