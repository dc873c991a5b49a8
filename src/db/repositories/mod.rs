pub mod event_repository;
pub mod health_repository;
pub mod note_repository;
pub mod task_repository;
pub mod user_repository;

use rusqlite::{Connection, ToSql};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

pub(crate) fn serialize_vec<T: Serialize>(values: &[T]) -> AppResult<Option<String>> {
    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(values)?))
    }
}

pub(crate) fn deserialize_vec<T: DeserializeOwned>(raw: Option<String>) -> AppResult<Vec<T>> {
    match raw {
        Some(value) if !value.is_empty() => Ok(serde_json::from_str(&value)?),
        _ => Ok(Vec::new()),
    }
}

pub(crate) fn serialize_struct<T: Serialize>(value: Option<&T>) -> AppResult<Option<String>> {
    match value {
        Some(data) => Ok(Some(serde_json::to_string(data)?)),
        None => Ok(None),
    }
}

pub(crate) fn deserialize_struct<T: DeserializeOwned>(raw: Option<String>) -> AppResult<Option<T>> {
    match raw {
        Some(value) if !value.is_empty() => Ok(Some(serde_json::from_str(&value)?)),
        _ => Ok(None),
    }
}

/// `SELECT COUNT(*)` over `table` for one owner.
pub(crate) fn count_owned(conn: &Connection, table: &str, user_id: &str) -> AppResult<usize> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1");
    let count: i64 = conn.query_row(&sql, [user_id], |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

/// Accumulates `column = ?` clauses and their bound values for filtered lists.
#[derive(Default)]
pub(crate) struct WhereClause {
    clauses: Vec<&'static str>,
    params: Vec<Box<dyn ToSql>>,
}

impl WhereClause {
    pub(crate) fn push<V: ToSql + 'static>(&mut self, clause: &'static str, value: V) {
        self.clauses.push(clause);
        self.params.push(Box::new(value));
    }

    pub(crate) fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
