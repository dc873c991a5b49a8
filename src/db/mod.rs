//! SQLite storage for users, tasks, notes, urgent events and health records.
//!
//! Every command opens its own connection. Opening a connection also brings
//! the schema up to date, so a database file rolled back or created by an
//! older build is migrated before any repository touches it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::AppResult;

pub mod migrations;

pub mod repositories;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// How long a command waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the TaskPulse database plus the rules for opening it.
///
/// Holds no live connection, so clones are free to move into blocking
/// command closures.
#[derive(Clone, Debug)]
pub struct DbPool {
    path: PathBuf,
}

impl DbPool {
    /// Creates the parent directory when needed and opens the store once so a
    /// broken path or schema fails at startup instead of on the first command.
    pub fn new<P: Into<PathBuf>>(path: P) -> AppResult<Self> {
        let path = path.into();
        info!(target: "app::db", db_path = %path.display(), "opening taskpulse store");
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let pool = Self { path };
        let conn = pool.get_connection()?;
        let version = migrations::current_version(&conn)?;
        info!(target: "app::db", schema_version = version, "taskpulse store ready");

        Ok(pool)
    }

    /// A fresh connection with pragmas set and the schema brought current.
    pub fn get_connection(&self) -> AppResult<Connection> {
        let conn = Connection::open(&self.path)?;
        apply_pragmas(&conn)?;
        prepare_schema(&conn)?;
        debug!(target: "app::db", db_path = %self.path.display(), "connection opened");
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.get_connection()?;
        callback(&conn)
    }

    /// For reads that must agree with the write that follows them, such as
    /// counting a user's rows before the cascade removes them. Nothing is
    /// committed unless `callback` returns `Ok`.
    pub fn with_transaction<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let value = callback(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// Cascading deletes from users depend on foreign_keys being on per connection.
fn apply_pragmas(conn: &Connection) -> AppResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", 1)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(())
}

fn prepare_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    migrations::run(conn)
}
