use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::task::TaskRecord;

use super::count_owned;

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        description,
        start_date,
        due_date,
        status,
        estimated_time,
        actual_time,
        completed_at,
        user_id,
        created_at,
        updated_at
    FROM tasks
"#;

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub due_date: String,
    pub status: String,
    pub estimated_time: Option<f64>,
    pub actual_time: Option<f64>,
    pub completed_at: Option<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            start_date: record.start_date.clone(),
            due_date: record.due_date.clone(),
            status: record.status.clone(),
            estimated_time: record.estimated_time,
            actual_time: record.actual_time,
            completed_at: record.completed_at.clone(),
            user_id: record.user_id.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> TaskRecord {
        TaskRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            due_date: self.due_date,
            status: self.status,
            estimated_time: self.estimated_time,
            actual_time: self.actual_time,
            completed_at: self.completed_at,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<&Row<'_>> for TaskRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(TaskRow {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            start_date: row.get("start_date")?,
            due_date: row.get("due_date")?,
            status: row.get("status")?,
            estimated_time: row.get("estimated_time")?,
            actual_time: row.get("actual_time")?,
            completed_at: row.get("completed_at")?,
            user_id: row.get("user_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct TaskRepository;

impl TaskRepository {
    pub fn insert(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO tasks (
                    id,
                    title,
                    description,
                    start_date,
                    due_date,
                    status,
                    estimated_time,
                    actual_time,
                    completed_at,
                    user_id,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :title,
                    :description,
                    :start_date,
                    :due_date,
                    :status,
                    :estimated_time,
                    :actual_time,
                    :completed_at,
                    :user_id,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":start_date": &row.start_date,
                ":due_date": &row.due_date,
                ":status": &row.status,
                ":estimated_time": &row.estimated_time,
                ":actual_time": &row.actual_time,
                ":completed_at": &row.completed_at,
                ":user_id": &row.user_id,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE tasks SET
                    title = :title,
                    description = :description,
                    start_date = :start_date,
                    due_date = :due_date,
                    status = :status,
                    estimated_time = :estimated_time,
                    actual_time = :actual_time,
                    completed_at = :completed_at,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":start_date": &row.start_date,
                ":due_date": &row.due_date,
                ":status": &row.status,
                ":estimated_time": &row.estimated_time,
                ":actual_time": &row.actual_time,
                ":completed_at": &row.completed_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found("task"));
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found("task"));
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<TaskRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE id = ?1"))?;
        let row = stmt
            .query_row([id], |row| TaskRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<TaskRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} ORDER BY created_at DESC"))?;
        let rows = stmt
            .query_map([], |row| TaskRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_by_user(conn: &Connection, user_id: &str) -> AppResult<Vec<TaskRow>> {
        let mut stmt = conn.prepare(&format!(
            "{BASE_SELECT} WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt
            .query_map([user_id], |row| TaskRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_by_user(conn: &Connection, user_id: &str) -> AppResult<usize> {
        count_owned(conn, "tasks", user_id)
    }
}
