use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::event::{ContactInfo, EventPriority, EventStatus, UrgentEventRecord};

use super::{count_owned, deserialize_struct, serialize_struct, WhereClause};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        description,
        event_date,
        event_time,
        location,
        priority,
        status,
        reminder_set,
        reminder_time,
        contact_info,
        user_id,
        created_at,
        updated_at
    FROM urgent_events
"#;

// Critical first, then high, then medium; soonest first within a priority.
const PRIORITY_ORDER: &str = r#"
    ORDER BY
        CASE priority WHEN 'critical' THEN 0 WHEN 'high' THEN 1 ELSE 2 END,
        event_date ASC
"#;

#[derive(Debug, Clone)]
pub struct UrgentEventRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub event_time: String,
    pub location: Option<String>,
    pub priority: String,
    pub status: String,
    pub reminder_set: bool,
    pub reminder_time: Option<String>,
    pub contact_info: Option<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UrgentEventRow {
    pub fn from_record(record: &UrgentEventRecord) -> AppResult<Self> {
        Ok(Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            event_date: record.event_date.clone(),
            event_time: record.event_time.clone(),
            location: record.location.clone(),
            priority: record.priority.as_str().to_string(),
            status: record.status.as_str().to_string(),
            reminder_set: record.reminder_set,
            reminder_time: record.reminder_time.clone(),
            contact_info: serialize_struct(record.contact_info.as_ref())?,
            user_id: record.user_id.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        })
    }

    pub fn into_record(self) -> AppResult<UrgentEventRecord> {
        let priority = EventPriority::try_from(self.priority.as_str()).map_err(AppError::database)?;
        let status = EventStatus::try_from(self.status.as_str()).map_err(AppError::database)?;

        Ok(UrgentEventRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            event_date: self.event_date,
            event_time: self.event_time,
            location: self.location,
            priority,
            status,
            reminder_set: self.reminder_set,
            reminder_time: self.reminder_time,
            contact_info: deserialize_struct::<ContactInfo>(self.contact_info)?,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for UrgentEventRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(UrgentEventRow {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            event_date: row.get("event_date")?,
            event_time: row.get("event_time")?,
            location: row.get("location")?,
            priority: row.get("priority")?,
            status: row.get("status")?,
            reminder_set: row.get::<_, i64>("reminder_set")? != 0,
            reminder_time: row.get("reminder_time")?,
            contact_info: row.get("contact_info")?,
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UrgentEventQuery {
    pub user_id: Option<String>,
    pub priority: Option<EventPriority>,
    pub status: Option<EventStatus>,
}

pub struct UrgentEventRepository;

impl UrgentEventRepository {
    pub fn insert(conn: &Connection, row: &UrgentEventRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO urgent_events (
                    id,
                    title,
                    description,
                    event_date,
                    event_time,
                    location,
                    priority,
                    status,
                    reminder_set,
                    reminder_time,
                    contact_info,
                    user_id,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :title,
                    :description,
                    :event_date,
                    :event_time,
                    :location,
                    :priority,
                    :status,
                    :reminder_set,
                    :reminder_time,
                    :contact_info,
                    :user_id,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":event_date": &row.event_date,
                ":event_time": &row.event_time,
                ":location": &row.location,
                ":priority": &row.priority,
                ":status": &row.status,
                ":reminder_set": row.reminder_set as i64,
                ":reminder_time": &row.reminder_time,
                ":contact_info": &row.contact_info,
                ":user_id": &row.user_id,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &UrgentEventRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE urgent_events SET
                    title = :title,
                    description = :description,
                    event_date = :event_date,
                    event_time = :event_time,
                    location = :location,
                    priority = :priority,
                    status = :status,
                    reminder_set = :reminder_set,
                    reminder_time = :reminder_time,
                    contact_info = :contact_info,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":event_date": &row.event_date,
                ":event_time": &row.event_time,
                ":location": &row.location,
                ":priority": &row.priority,
                ":status": &row.status,
                ":reminder_set": row.reminder_set as i64,
                ":reminder_time": &row.reminder_time,
                ":contact_info": &row.contact_info,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found("urgent event"));
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM urgent_events WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found("urgent event"));
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<UrgentEventRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE id = ?1"))?;
        let row = stmt
            .query_row([id], |row| UrgentEventRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list(conn: &Connection, query: &UrgentEventQuery) -> AppResult<Vec<UrgentEventRow>> {
        let mut filter = WhereClause::default();
        if let Some(user_id) = &query.user_id {
            filter.push("user_id = ?", user_id.clone());
        }
        if let Some(priority) = query.priority {
            filter.push("priority = ?", priority.as_str());
        }
        if let Some(status) = query.status {
            filter.push("status = ?", status.as_str());
        }

        let sql = format!("{BASE_SELECT}{}{PRIORITY_ORDER}", filter.sql());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(filter.params().as_slice(), |row| UrgentEventRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_by_user(conn: &Connection, user_id: &str) -> AppResult<usize> {
        count_owned(conn, "urgent_events", user_id)
    }
}
