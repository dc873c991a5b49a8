use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::db::repositories::note_repository::{NoteQuery, NoteRepository, NoteRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::note::{
    NoteCreateInput, NoteListFilters, NoteRecord, NoteStats, NoteUpdateInput, DEFAULT_CATEGORY,
    VALID_CATEGORIES,
};
use crate::services::{now_rfc3339, require_user};

const CATEGORY_ALL: &str = "all";
const MAX_TAGS: usize = 30;

#[derive(Clone)]
pub struct NoteService {
    db: DbPool,
}

impl NoteService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_note(&self, input: NoteCreateInput) -> AppResult<NoteRecord> {
        if input.title.trim().is_empty()
            || input.content.trim().is_empty()
            || input.user_id.trim().is_empty()
        {
            return Err(AppError::validation(
                "Title, content, and userId are required",
            ));
        }

        let now = now_rfc3339();
        let record = NoteRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            content: input.content,
            category: normalize_category(input.category)?,
            tags: normalize_tags(input.tags.unwrap_or_default())?,
            is_pinned: input.is_pinned.unwrap_or(false),
            user_id: input.user_id.trim().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let row = NoteRow::from_record(&record)?;
        self.db.with_connection(|conn| {
            require_user(conn, &row.user_id)?;
            NoteRepository::insert(conn, &row)
        })?;
        info!(note_id = %record.id, user_id = %record.user_id, "note created");
        Ok(record)
    }

    /// Notes of an existing user, filtered. Pinned first, newest first.
    pub fn list_by_user(
        &self,
        user_id: &str,
        filters: NoteListFilters,
    ) -> AppResult<Vec<NoteRecord>> {
        self.db
            .with_connection(|conn| require_user(conn, user_id))?;
        self.list_notes(NoteListFilters {
            user_id: Some(user_id.to_string()),
            ..filters
        })
    }

    pub fn list_notes(&self, filters: NoteListFilters) -> AppResult<Vec<NoteRecord>> {
        let query = NoteQuery {
            user_id: filters.user_id.filter(|id| !id.trim().is_empty()),
            category: filters
                .category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty() && c != CATEGORY_ALL),
            is_pinned: filters.is_pinned,
        };
        let search = filters
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let rows = self
            .db
            .with_connection(|conn| NoteRepository::list(conn, &query))?;
        let notes = rows
            .into_iter()
            .map(NoteRow::into_record)
            .collect::<AppResult<Vec<_>>>()?
            .into_iter()
            .filter(|note| match search.as_deref() {
                Some(needle) => matches_search(note, needle),
                None => true,
            })
            .collect::<Vec<_>>();

        debug!(count = notes.len(), "notes listed");
        Ok(notes)
    }

    pub fn get_note(&self, id: &str) -> AppResult<NoteRecord> {
        let row = self
            .db
            .with_connection(|conn| NoteRepository::find_by_id(conn, id))?
            .ok_or_else(|| AppError::not_found("note"))?;
        row.into_record()
    }

    pub fn update_note(&self, id: &str, update: NoteUpdateInput) -> AppResult<NoteRecord> {
        let mut note = self.get_note(id)?;

        if let Some(title) = update.title.filter(|t| !t.trim().is_empty()) {
            note.title = title.trim().to_string();
        }
        if let Some(content) = update.content.filter(|c| !c.trim().is_empty()) {
            note.content = content;
        }
        if let Some(category) = update.category.filter(|c| !c.trim().is_empty()) {
            note.category = normalize_category(Some(category))?;
        }
        if let Some(tags) = update.tags {
            note.tags = normalize_tags(tags)?;
        }
        if let Some(is_pinned) = update.is_pinned {
            note.is_pinned = is_pinned;
        }
        note.updated_at = now_rfc3339();

        self.save(&note)?;
        info!(note_id = %note.id, "note updated");
        Ok(note)
    }

    /// Returns the removed note so callers can echo its id and title.
    pub fn delete_note(&self, id: &str) -> AppResult<NoteRecord> {
        let note = self.get_note(id)?;
        self.db
            .with_connection(|conn| NoteRepository::delete(conn, id))?;
        info!(note_id = %id, "note deleted");
        Ok(note)
    }

    pub fn toggle_pin(&self, id: &str) -> AppResult<NoteRecord> {
        let mut note = self.get_note(id)?;
        note.is_pinned = !note.is_pinned;
        note.updated_at = now_rfc3339();
        self.save(&note)?;
        info!(note_id = %note.id, pinned = note.is_pinned, "note pin toggled");
        Ok(note)
    }

    pub fn note_stats(&self, user_id: &str) -> AppResult<NoteStats> {
        let rows = self.db.with_connection(|conn| {
            require_user(conn, user_id)?;
            NoteRepository::list(
                conn,
                &NoteQuery {
                    user_id: Some(user_id.to_string()),
                    ..Default::default()
                },
            )
        })?;

        let mut category_count = BTreeMap::new();
        let mut pinned_notes = 0;
        for row in &rows {
            *category_count.entry(row.category.clone()).or_insert(0) += 1;
            if row.is_pinned {
                pinned_notes += 1;
            }
        }

        debug!(user_id = %user_id, total = rows.len(), "note stats computed");
        Ok(NoteStats {
            total_notes: rows.len(),
            pinned_notes,
            category_count,
        })
    }

    fn save(&self, note: &NoteRecord) -> AppResult<()> {
        let row = NoteRow::from_record(note)?;
        self.db
            .with_connection(|conn| NoteRepository::update(conn, &row))
    }
}

fn matches_search(note: &NoteRecord, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
        || note.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

fn normalize_category(category: Option<String>) -> AppResult<String> {
    let value = category
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    if VALID_CATEGORIES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(AppError::validation(format!(
            "category must be one of {}",
            VALID_CATEGORIES.join(", ")
        )))
    }
}

fn normalize_tags(values: Vec<String>) -> AppResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            result.push(trimmed.to_string());
        }
        if result.len() > MAX_TAGS {
            return Err(AppError::validation(format!("at most {MAX_TAGS} tags are allowed")));
        }
    }

    Ok(result)
}
