use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::note::NoteRecord;

use super::{count_owned, deserialize_vec, serialize_vec, WhereClause};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        content,
        category,
        tags,
        is_pinned,
        user_id,
        created_at,
        updated_at
    FROM notes
"#;

#[derive(Debug, Clone)]
pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Option<String>,
    pub is_pinned: bool,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl NoteRow {
    pub fn from_record(record: &NoteRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            title: record.title.clone(),
            content: record.content.clone(),
            category: record.category.clone(),
            tags: serialize_vec(&record.tags)?,
            is_pinned: record.is_pinned,
            user_id: record.user_id.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        })
    }

    pub fn into_record(self) -> AppResult<NoteRecord> {
        Ok(NoteRecord {
            id: self.id,
            title: self.title,
            content: self.content,
            category: self.category,
            tags: deserialize_vec(self.tags)?,
            is_pinned: self.is_pinned,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for NoteRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(NoteRow {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            category: row.get("category")?,
            tags: row.get("tags")?,
            is_pinned: row.get::<_, i64>("is_pinned")? != 0,
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Column filters pushed down to SQL. Text search happens in the service.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
    pub user_id: Option<String>,
    pub category: Option<String>,
    pub is_pinned: Option<bool>,
}

pub struct NoteRepository;

impl NoteRepository {
    pub fn insert(conn: &Connection, row: &NoteRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO notes (
                    id, title, content, category, tags, is_pinned, user_id, created_at, updated_at
                ) VALUES (
                    :id, :title, :content, :category, :tags, :is_pinned, :user_id,
                    :created_at, :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":content": &row.content,
                ":category": &row.category,
                ":tags": &row.tags,
                ":is_pinned": row.is_pinned as i64,
                ":user_id": &row.user_id,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &NoteRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE notes SET
                    title = :title,
                    content = :content,
                    category = :category,
                    tags = :tags,
                    is_pinned = :is_pinned,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":content": &row.content,
                ":category": &row.category,
                ":tags": &row.tags,
                ":is_pinned": row.is_pinned as i64,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found("note"));
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found("note"));
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<NoteRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE id = ?1"))?;
        let row = stmt
            .query_row([id], |row| NoteRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Pinned notes first, then newest first.
    pub fn list(conn: &Connection, query: &NoteQuery) -> AppResult<Vec<NoteRow>> {
        let mut filter = WhereClause::default();
        if let Some(user_id) = &query.user_id {
            filter.push("user_id = ?", user_id.clone());
        }
        if let Some(category) = &query.category {
            filter.push("category = ?", category.clone());
        }
        if let Some(is_pinned) = query.is_pinned {
            filter.push("is_pinned = ?", is_pinned as i64);
        }

        let sql = format!(
            "{BASE_SELECT}{} ORDER BY is_pinned DESC, created_at DESC",
            filter.sql()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(filter.params().as_slice(), |row| NoteRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_by_user(conn: &Connection, user_id: &str) -> AppResult<usize> {
        count_owned(conn, "notes", user_id)
    }
}
