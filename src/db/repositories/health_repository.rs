use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::health::{Attachment, HealthData, HealthRecord};

use super::{count_owned, deserialize_struct, deserialize_vec, serialize_vec, WhereClause};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        category,
        data,
        notes,
        attachments,
        date_recorded,
        is_private,
        user_id,
        created_at,
        updated_at
    FROM health_records
"#;

#[derive(Debug, Clone)]
pub struct HealthRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub data: String,
    pub notes: Option<String>,
    pub attachments: Option<String>,
    pub date_recorded: String,
    pub is_private: bool,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl HealthRow {
    pub fn from_record(record: &HealthRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            title: record.title.clone(),
            category: record.category.clone(),
            data: serde_json::to_string(&record.data)?,
            notes: record.notes.clone(),
            attachments: serialize_vec(&record.attachments)?,
            date_recorded: record.date_recorded.clone(),
            is_private: record.is_private,
            user_id: record.user_id.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        })
    }

    pub fn into_record(self) -> AppResult<HealthRecord> {
        Ok(HealthRecord {
            id: self.id,
            title: self.title,
            category: self.category,
            data: deserialize_struct::<HealthData>(Some(self.data))?.unwrap_or_default(),
            notes: self.notes,
            attachments: deserialize_vec::<Attachment>(self.attachments)?,
            date_recorded: self.date_recorded,
            is_private: self.is_private,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for HealthRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(HealthRow {
            id: row.get("id")?,
            title: row.get("title")?,
            category: row.get("category")?,
            data: row.get("data")?,
            notes: row.get("notes")?,
            attachments: row.get("attachments")?,
            date_recorded: row.get("date_recorded")?,
            is_private: row.get::<_, i64>("is_private")? != 0,
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthQuery {
    pub user_id: Option<String>,
    pub category: Option<String>,
}

pub struct HealthRepository;

impl HealthRepository {
    pub fn insert(conn: &Connection, row: &HealthRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO health_records (
                    id,
                    title,
                    category,
                    data,
                    notes,
                    attachments,
                    date_recorded,
                    is_private,
                    user_id,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :title,
                    :category,
                    :data,
                    :notes,
                    :attachments,
                    :date_recorded,
                    :is_private,
                    :user_id,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":category": &row.category,
                ":data": &row.data,
                ":notes": &row.notes,
                ":attachments": &row.attachments,
                ":date_recorded": &row.date_recorded,
                ":is_private": row.is_private as i64,
                ":user_id": &row.user_id,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &HealthRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE health_records SET
                    title = :title,
                    category = :category,
                    data = :data,
                    notes = :notes,
                    attachments = :attachments,
                    date_recorded = :date_recorded,
                    is_private = :is_private,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":category": &row.category,
                ":data": &row.data,
                ":notes": &row.notes,
                ":attachments": &row.attachments,
                ":date_recorded": &row.date_recorded,
                ":is_private": row.is_private as i64,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found("health record"));
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM health_records WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found("health record"));
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<HealthRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE id = ?1"))?;
        let row = stmt
            .query_row([id], |row| HealthRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Newest `date_recorded` first.
    pub fn list(conn: &Connection, query: &HealthQuery) -> AppResult<Vec<HealthRow>> {
        let mut filter = WhereClause::default();
        if let Some(user_id) = &query.user_id {
            filter.push("user_id = ?", user_id.clone());
        }
        if let Some(category) = &query.category {
            filter.push("category = ?", category.clone());
        }

        let sql = format!("{BASE_SELECT}{} ORDER BY date_recorded DESC", filter.sql());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(filter.params().as_slice(), |row| HealthRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_by_user(conn: &Connection, user_id: &str) -> AppResult<usize> {
        count_owned(conn, "health_records", user_id)
    }
}
