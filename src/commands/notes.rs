use serde::Serialize;

use crate::models::note::{NoteCreateInput, NoteListFilters, NoteRecord, NoteStats, NoteUpdateInput};

use super::{run_blocking, AppState, CommandResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub message: String,
    pub note: NoteRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListResponse {
    pub message: String,
    pub count: usize,
    pub notes: Vec<NoteRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedNote {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDeleteResponse {
    pub message: String,
    pub deleted_note: DeletedNote,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStatsResponse {
    pub message: String,
    pub stats: NoteStats,
}

fn note_response(message: impl Into<String>, note: NoteRecord) -> NoteResponse {
    NoteResponse {
        message: message.into(),
        note,
    }
}

fn list_response(notes: Vec<NoteRecord>) -> NoteListResponse {
    NoteListResponse {
        message: "Notes retrieved successfully".to_string(),
        count: notes.len(),
        notes,
    }
}

pub async fn notes_create(
    state: &AppState,
    payload: NoteCreateInput,
) -> CommandResult<NoteResponse> {
    let app_state = state.clone();
    let note = run_blocking(move || app_state.notes().create_note(payload)).await?;
    Ok(note_response("Note created successfully", note))
}

pub async fn notes_list_by_user(
    state: &AppState,
    user_id: String,
    filters: Option<NoteListFilters>,
) -> CommandResult<NoteListResponse> {
    let app_state = state.clone();
    let filters = filters.unwrap_or_default();
    let notes = run_blocking(move || app_state.notes().list_by_user(&user_id, filters)).await?;
    Ok(list_response(notes))
}

pub async fn notes_list(
    state: &AppState,
    filters: Option<NoteListFilters>,
) -> CommandResult<NoteListResponse> {
    let app_state = state.clone();
    let filters = filters.unwrap_or_default();
    let notes = run_blocking(move || app_state.notes().list_notes(filters)).await?;
    Ok(list_response(notes))
}

pub async fn notes_get(state: &AppState, id: String) -> CommandResult<NoteResponse> {
    let app_state = state.clone();
    let note = run_blocking(move || app_state.notes().get_note(&id)).await?;
    Ok(note_response("Note retrieved successfully", note))
}

pub async fn notes_update(
    state: &AppState,
    id: String,
    payload: NoteUpdateInput,
) -> CommandResult<NoteResponse> {
    let app_state = state.clone();
    let note = run_blocking(move || app_state.notes().update_note(&id, payload)).await?;
    Ok(note_response("Note updated successfully", note))
}

pub async fn notes_delete(state: &AppState, id: String) -> CommandResult<NoteDeleteResponse> {
    let app_state = state.clone();
    let note = run_blocking(move || app_state.notes().delete_note(&id)).await?;
    Ok(NoteDeleteResponse {
        message: "Note deleted successfully".to_string(),
        deleted_note: DeletedNote {
            id: note.id,
            title: note.title,
        },
    })
}

pub async fn notes_toggle_pin(state: &AppState, id: String) -> CommandResult<NoteResponse> {
    let app_state = state.clone();
    let note = run_blocking(move || app_state.notes().toggle_pin(&id)).await?;
    let verb = if note.is_pinned { "pinned" } else { "unpinned" };
    Ok(note_response(format!("Note {verb} successfully"), note))
}

pub async fn notes_stats(state: &AppState, user_id: String) -> CommandResult<NoteStatsResponse> {
    let app_state = state.clone();
    let stats = run_blocking(move || app_state.notes().note_stats(&user_id)).await?;
    Ok(NoteStatsResponse {
        message: "Notes statistics retrieved successfully".to_string(),
        stats,
    })
}
