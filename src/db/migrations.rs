use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use tracing::{info, warn};

use crate::error::AppResult;

const USER_VERSION: i32 = 3;

#[derive(Debug)]
pub struct MigrationInfo {
    pub version: i32,
    pub description: String,
    pub applied_at: DateTime<Utc>,
}

pub fn run(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL,
            rollback_sql TEXT
        );
        "#,
    )?;

    let mut current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version < 1 {
        info!(target: "app::db", version = current_version, "running migration v1");
        migrate_to_v1(conn)?;
        current_version = 1;
        conn.execute_batch(&format!("PRAGMA user_version = {current_version}"))?;
        record_migration(conn, 1, "Add task timing columns", None)?;
    }

    if current_version < 2 {
        info!(target: "app::db", version = current_version, "running migration v2");
        migrate_to_v2(conn)?;
        current_version = 2;
        conn.execute_batch(&format!("PRAGMA user_version = {current_version}"))?;
        record_migration(
            conn,
            2,
            "Add urgent events",
            Some("DROP TABLE IF EXISTS urgent_events;"),
        )?;
    }

    if current_version < 3 {
        info!(target: "app::db", version = current_version, "running migration v3");
        migrate_to_v3(conn)?;
        current_version = 3;
        conn.execute_batch(&format!("PRAGMA user_version = {current_version}"))?;
        record_migration(
            conn,
            3,
            "Add health records",
            Some("DROP TABLE IF EXISTS health_records;"),
        )?;
    }

    if current_version != USER_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {USER_VERSION}"))?;
    }

    Ok(())
}

fn record_migration(
    conn: &Connection,
    version: i32,
    description: &str,
    rollback_sql: Option<&str>,
) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO migration_history (version, description, applied_at, rollback_sql)
         VALUES (?1, ?2, ?3, ?4)",
        (version, description, now, rollback_sql),
    )?;
    Ok(())
}

pub fn current_version(conn: &Connection) -> AppResult<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

pub fn rollback_to_version(conn: &Connection, target_version: i32) -> AppResult<()> {
    let current_version = current_version(conn)?;

    if target_version >= current_version {
        warn!(
            target: "app::db",
            target_version,
            current_version,
            "rollback target is not below the current schema version"
        );
        return Ok(());
    }

    let mut stmt = conn.prepare(
        "SELECT version, rollback_sql FROM migration_history
         WHERE version > ?1 ORDER BY version DESC",
    )?;

    let scripts = stmt
        .query_map([target_version], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (version, rollback_sql) in scripts {
        match rollback_sql {
            Some(sql) => {
                info!(target: "app::db", version, "rolling back migration");
                conn.execute_batch(&sql)?;
            }
            None => warn!(target: "app::db", version, "no rollback script for migration"),
        }
    }

    conn.execute_batch(&format!("PRAGMA user_version = {target_version}"))?;
    conn.execute(
        "DELETE FROM migration_history WHERE version > ?1",
        [target_version],
    )?;

    Ok(())
}

pub fn get_migration_history(conn: &Connection) -> AppResult<Vec<MigrationInfo>> {
    let mut stmt = conn.prepare(
        "SELECT version, description, applied_at FROM migration_history ORDER BY version",
    )?;

    let migrations = stmt
        .query_map([], |row| {
            let applied_at_str: String = row.get(2)?;
            let applied_at = DateTime::parse_from_rfc3339(&applied_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "applied_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Utc);

            Ok(MigrationInfo {
                version: row.get(0)?,
                description: row.get(1)?,
                applied_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(migrations)
}

fn migrate_to_v1(conn: &Connection) -> AppResult<()> {
    ensure_column(conn, "tasks", "estimated_time", "REAL")?;
    ensure_column(conn, "tasks", "actual_time", "REAL")?;
    ensure_column(conn, "tasks", "completed_at", "TEXT")?;

    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);
        CREATE INDEX IF NOT EXISTS idx_tasks_updated_at ON tasks(updated_at);
        "#,
    )?;

    Ok(())
}

fn migrate_to_v2(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS urgent_events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            event_date TEXT NOT NULL,
            event_time TEXT NOT NULL,
            location TEXT,
            priority TEXT NOT NULL DEFAULT 'high',
            status TEXT NOT NULL DEFAULT 'upcoming',
            reminder_set INTEGER NOT NULL DEFAULT 0,
            reminder_time TEXT,
            contact_info TEXT,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_urgent_events_user_id ON urgent_events(user_id);
        CREATE INDEX IF NOT EXISTS idx_urgent_events_event_date ON urgent_events(event_date);
        "#,
    )?;

    Ok(())
}

fn migrate_to_v3(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS health_records (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            data TEXT NOT NULL DEFAULT '{}',
            notes TEXT,
            attachments TEXT,
            date_recorded TEXT NOT NULL,
            is_private INTEGER NOT NULL DEFAULT 1,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_health_records_user_id ON health_records(user_id);
        CREATE INDEX IF NOT EXISTS idx_health_records_date_recorded
            ON health_records(date_recorded);
        "#,
    )?;

    Ok(())
}

fn ensure_column(conn: &Connection, table: &str, column: &str, definition: &str) -> AppResult<()> {
    if !column_exists(conn, table, column)? {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {definition};");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

pub(crate) fn column_exists(conn: &Connection, table: &str, column: &str) -> AppResult<bool> {
    let pragma = format!("PRAGMA table_info({table})");
    let mut stmt = conn.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        if equals_name(row, column)? {
            return Ok(true);
        }
    }

    Ok(false)
}

fn equals_name(row: &Row<'_>, column: &str) -> Result<bool, rusqlite::Error> {
    let name: String = row.get(1)?;
    Ok(name.eq_ignore_ascii_case(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_connection() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(include_str!("schema.sql"))
            .expect("base schema");
        run(&conn).expect("migrations");
        conn
    }

    #[test]
    fn migrations_reach_latest_version() {
        let conn = fresh_connection();
        assert_eq!(current_version(&conn).unwrap(), USER_VERSION);
        assert!(column_exists(&conn, "tasks", "estimated_time").unwrap());
        assert!(column_exists(&conn, "tasks", "actual_time").unwrap());
        assert!(column_exists(&conn, "tasks", "completed_at").unwrap());

        let history = get_migration_history(&conn).unwrap();
        let versions: Vec<i32> = history.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[test]
    fn running_twice_is_a_no_op() {
        let conn = fresh_connection();
        run(&conn).expect("second run");
        assert_eq!(get_migration_history(&conn).unwrap().len(), 3);
    }

    #[test]
    fn rollback_drops_later_tables() {
        let conn = fresh_connection();
        rollback_to_version(&conn, 1).expect("rollback");

        assert_eq!(current_version(&conn).unwrap(), 1);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('urgent_events', 'health_records')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);

        run(&conn).expect("re-apply");
        assert_eq!(current_version(&conn).unwrap(), USER_VERSION);
    }
}
