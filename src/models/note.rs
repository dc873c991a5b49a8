use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const VALID_CATEGORIES: &[&str] = &["personal", "work", "study", "important", "other"];
pub const DEFAULT_CATEGORY: &str = "other";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreateInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteListFilters {
    pub user_id: Option<String>,
    /// `all` disables the category filter.
    pub category: Option<String>,
    pub is_pinned: Option<bool>,
    /// Case-insensitive match over title, content and tags.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
    pub total_notes: usize,
    pub pinned_notes: usize,
    pub category_count: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteActivity {
    pub id: String,
    pub title: String,
    pub updated_at: String,
}

impl From<&NoteRecord> for NoteActivity {
    fn from(note: &NoteRecord) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            updated_at: note.updated_at.clone(),
        }
    }
}
