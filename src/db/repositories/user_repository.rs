use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::user::UserRecord;

const BASE_SELECT: &str = r#"
    SELECT
        id,
        username,
        email,
        password_hash,
        created_at,
        updated_at
    FROM users
"#;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            username: record.username.clone(),
            email: record.email.clone(),
            password_hash: record.password_hash.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> UserRecord {
        UserRecord {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<&Row<'_>> for UserRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(UserRow {
            id: row.get("id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct UserRepository;

impl UserRepository {
    pub fn insert(conn: &Connection, row: &UserRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
                VALUES (:id, :username, :email, :password_hash, :created_at, :updated_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":username": &row.username,
                ":email": &row.email,
                ":password_hash": &row.password_hash,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;
        Ok(())
    }

    pub fn update(conn: &Connection, row: &UserRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE users SET
                    username = :username,
                    email = :email,
                    password_hash = :password_hash,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":username": &row.username,
                ":email": &row.email,
                ":password_hash": &row.password_hash,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found("user"));
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found("user"));
        }
        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<UserRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE id = ?1"))?;
        let row = stmt
            .query_row([id], |row| UserRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<UserRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} WHERE username = ?1"))?;
        let row = stmt
            .query_row([username], |row| UserRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Id of a user other than `exclude_id` already holding `username` or `email`.
    pub fn find_conflicting(
        conn: &Connection,
        username: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<Option<UserRow>> {
        let mut stmt = conn.prepare(&format!(
            "{BASE_SELECT} WHERE (username = :username OR email = :email)
             AND id != :exclude_id LIMIT 1"
        ))?;
        let row = stmt
            .query_row(
                named_params! {
                    ":username": username,
                    ":email": email,
                    ":exclude_id": exclude_id.unwrap_or(""),
                },
                |row| UserRow::try_from(row),
            )
            .optional()?;
        Ok(row)
    }

    pub fn exists(conn: &Connection, id: &str) -> AppResult<bool> {
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<UserRow>> {
        let mut stmt = conn.prepare(&format!("{BASE_SELECT} ORDER BY created_at ASC"))?;
        let rows = stmt
            .query_map([], |row| UserRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
