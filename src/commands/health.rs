use serde::Serialize;

use crate::models::health::{
    HealthCreateInput, HealthFilters, HealthRecord, HealthStats, HealthUpdateInput,
};

use super::{run_blocking, AppState, CommandResult, MessageResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub message: String,
    pub health_data: HealthRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthListResponse {
    pub message: String,
    pub count: usize,
    pub health_data: Vec<HealthRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatsResponse {
    pub message: String,
    pub stats: HealthStats,
}

fn list_response(records: Vec<HealthRecord>) -> HealthListResponse {
    HealthListResponse {
        message: "Health data retrieved successfully".to_string(),
        count: records.len(),
        health_data: records,
    }
}

pub async fn health_create(
    state: &AppState,
    payload: HealthCreateInput,
) -> CommandResult<HealthResponse> {
    let app_state = state.clone();
    let record = run_blocking(move || app_state.health().create_record(payload)).await?;
    Ok(HealthResponse {
        message: "Health data created successfully".to_string(),
        health_data: record,
    })
}

pub async fn health_list_by_user(
    state: &AppState,
    user_id: String,
    filters: Option<HealthFilters>,
) -> CommandResult<HealthListResponse> {
    let app_state = state.clone();
    let filters = filters.unwrap_or_default();
    let records = run_blocking(move || app_state.health().list_by_user(&user_id, filters)).await?;
    Ok(list_response(records))
}

pub async fn health_list(
    state: &AppState,
    filters: Option<HealthFilters>,
) -> CommandResult<HealthListResponse> {
    let app_state = state.clone();
    let filters = filters.unwrap_or_default();
    let records = run_blocking(move || app_state.health().list_records(filters)).await?;
    Ok(list_response(records))
}

pub async fn health_update(
    state: &AppState,
    id: String,
    payload: HealthUpdateInput,
) -> CommandResult<HealthResponse> {
    let app_state = state.clone();
    let record = run_blocking(move || app_state.health().update_record(&id, payload)).await?;
    Ok(HealthResponse {
        message: "Health data updated successfully".to_string(),
        health_data: record,
    })
}

pub async fn health_delete(state: &AppState, id: String) -> CommandResult<MessageResponse> {
    let app_state = state.clone();
    run_blocking(move || app_state.health().delete_record(&id)).await?;
    Ok(MessageResponse::new("Health data deleted successfully"))
}

pub async fn health_stats(state: &AppState, user_id: String) -> CommandResult<HealthStatsResponse> {
    let app_state = state.clone();
    let stats = run_blocking(move || app_state.health().health_stats(&user_id)).await?;
    Ok(HealthStatsResponse {
        message: "Health data statistics retrieved successfully".to_string(),
        stats,
    })
}
