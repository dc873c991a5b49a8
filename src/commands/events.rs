use serde::Serialize;

use crate::models::event::{
    UrgentEventCreateInput, UrgentEventFilters, UrgentEventRecord, UrgentEventStats,
    UrgentEventUpdateInput,
};

use super::{run_blocking, AppState, CommandResult, MessageResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEventResponse {
    pub message: String,
    pub urgent_event: UrgentEventRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEventListResponse {
    pub message: String,
    pub count: usize,
    pub urgent_events: Vec<UrgentEventRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgentEventStatsResponse {
    pub message: String,
    pub stats: UrgentEventStats,
}

fn list_response(events: Vec<UrgentEventRecord>) -> UrgentEventListResponse {
    UrgentEventListResponse {
        message: "Urgent events retrieved successfully".to_string(),
        count: events.len(),
        urgent_events: events,
    }
}

pub async fn events_create(
    state: &AppState,
    payload: UrgentEventCreateInput,
) -> CommandResult<UrgentEventResponse> {
    let app_state = state.clone();
    let event = run_blocking(move || app_state.events().create_event(payload)).await?;
    Ok(UrgentEventResponse {
        message: "Urgent event created successfully".to_string(),
        urgent_event: event,
    })
}

pub async fn events_list_by_user(
    state: &AppState,
    user_id: String,
    filters: Option<UrgentEventFilters>,
) -> CommandResult<UrgentEventListResponse> {
    let app_state = state.clone();
    let filters = filters.unwrap_or_default();
    let events = run_blocking(move || app_state.events().list_by_user(&user_id, filters)).await?;
    Ok(list_response(events))
}

pub async fn events_list(
    state: &AppState,
    filters: Option<UrgentEventFilters>,
) -> CommandResult<UrgentEventListResponse> {
    let app_state = state.clone();
    let filters = filters.unwrap_or_default();
    let events = run_blocking(move || app_state.events().list_events(filters)).await?;
    Ok(list_response(events))
}

pub async fn events_update(
    state: &AppState,
    id: String,
    payload: UrgentEventUpdateInput,
) -> CommandResult<UrgentEventResponse> {
    let app_state = state.clone();
    let event = run_blocking(move || app_state.events().update_event(&id, payload)).await?;
    Ok(UrgentEventResponse {
        message: "Urgent event updated successfully".to_string(),
        urgent_event: event,
    })
}

pub async fn events_delete(state: &AppState, id: String) -> CommandResult<MessageResponse> {
    let app_state = state.clone();
    run_blocking(move || app_state.events().delete_event(&id)).await?;
    Ok(MessageResponse::new("Urgent event deleted successfully"))
}

pub async fn events_stats(
    state: &AppState,
    user_id: String,
) -> CommandResult<UrgentEventStatsResponse> {
    let app_state = state.clone();
    let stats = run_blocking(move || app_state.events().event_stats(&user_id)).await?;
    Ok(UrgentEventStatsResponse {
        message: "Urgent events statistics retrieved successfully".to_string(),
        stats,
    })
}
