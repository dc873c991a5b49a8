use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::db::repositories::event_repository::UrgentEventRepository;
use crate::db::repositories::health_repository::HealthRepository;
use crate::db::repositories::note_repository::NoteRepository;
use crate::db::repositories::task_repository::TaskRepository;
use crate::db::repositories::user_repository::{UserRepository, UserRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::task::{STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_PENDING};
use crate::models::user::{
    PublicUser, UserCreateInput, UserRecord, UserTaskStats, UserUpdateInput, UserWithTasks,
};
use crate::services::task_analytics::analyze_task_patterns;
use crate::services::{now_rfc3339, require_user};
use crate::utils::crypto::{fingerprint, hash_password, verify_password};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const MAX_USERNAME_LEN: usize = 50;

#[derive(Clone)]
pub struct UserService {
    db: DbPool,
}

impl UserService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn add_user(&self, input: UserCreateInput) -> AppResult<PublicUser> {
        if input.username.trim().is_empty()
            || input.password.is_empty()
            || input.email.trim().is_empty()
        {
            return Err(AppError::validation("Please fill all the fields"));
        }

        let username = normalize_username(&input.username)?;
        let email = normalize_email(&input.email)?;
        let password_hash = hash_password(&input.password)?;
        let now = now_rfc3339();

        let record = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            created_at: now.clone(),
            updated_at: now,
        };

        let row = UserRow::from_record(&record);
        self.db.with_connection(|conn| {
            if UserRepository::find_conflicting(conn, &row.username, &row.email, None)?.is_some() {
                return Err(AppError::conflict(
                    "User with this email or username already exists",
                ));
            }
            UserRepository::insert(conn, &row)
        })?;

        info!(user_id = %record.id, email = %fingerprint(&record.email), "user registered");
        Ok(PublicUser::from(&record))
    }

    /// Looks a user up by name. When a password is given it must match.
    pub fn check_user(&self, username: &str, password: Option<&str>) -> AppResult<PublicUser> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("Username is required"));
        }

        let record = self
            .db
            .with_connection(|conn| UserRepository::find_by_username(conn, username))?
            .ok_or_else(|| AppError::not_found("user"))?
            .into_record();

        if let Some(password) = password {
            if !verify_password(password, &record.password_hash)? {
                return Err(AppError::validation("Invalid username or password"));
            }
        }

        debug!(user_id = %record.id, "user checked");
        Ok(PublicUser::from(&record))
    }

    pub fn list_users(&self) -> AppResult<Vec<PublicUser>> {
        let rows = self.db.with_connection(UserRepository::list_all)?;
        let users = rows
            .into_iter()
            .map(|row| PublicUser::from(&row.into_record()))
            .collect::<Vec<_>>();
        debug!(count = users.len(), "users listed");
        Ok(users)
    }

    pub fn get_user(&self, id: &str) -> AppResult<PublicUser> {
        let record = self.get_record(id)?;
        debug!(user_id = %record.id, "user fetched");
        Ok(PublicUser::from(&record))
    }

    pub fn get_user_with_tasks(&self, id: &str) -> AppResult<UserWithTasks> {
        let (record, rows) = self.db.with_connection(|conn| {
            let record = UserRepository::find_by_id(conn, id)?
                .ok_or_else(|| AppError::not_found("user"))?
                .into_record();
            let rows = TaskRepository::list_by_user(conn, id)?;
            Ok((record, rows))
        })?;

        let tasks = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<Vec<_>>();
        debug!(user_id = %record.id, tasks = tasks.len(), "user with tasks fetched");

        Ok(UserWithTasks {
            user: PublicUser::from(&record),
            tasks_count: tasks.len(),
            tasks,
        })
    }

    pub fn update_user(&self, id: &str, update: UserUpdateInput) -> AppResult<PublicUser> {
        let mut record = self.get_record(id)?;

        let username = update
            .username
            .filter(|value| !value.trim().is_empty())
            .map(|value| normalize_username(&value))
            .transpose()?;
        let email = update
            .email
            .filter(|value| !value.trim().is_empty())
            .map(|value| normalize_email(&value))
            .transpose()?;

        if username.is_none() && email.is_none() {
            return Ok(PublicUser::from(&record));
        }

        if let Some(username) = username.clone() {
            record.username = username;
        }
        if let Some(email) = email.clone() {
            record.email = email;
        }
        record.updated_at = now_rfc3339();

        let row = UserRow::from_record(&record);
        self.db.with_connection(|conn| {
            // Only the fields being changed take part in the uniqueness check.
            let candidate_username = username.as_deref().unwrap_or("");
            let candidate_email = email.as_deref().unwrap_or("");
            let conflict = UserRepository::find_conflicting(
                conn,
                candidate_username,
                candidate_email,
                Some(id),
            )?;
            if conflict.is_some() {
                return Err(AppError::conflict("Username or email already exists"));
            }
            UserRepository::update(conn, &row)
        })?;

        info!(user_id = %record.id, "user updated");
        Ok(PublicUser::from(&record))
    }

    /// Deletes the user together with everything it owns and reports how many
    /// tasks went with it.
    pub fn delete_user(&self, id: &str) -> AppResult<usize> {
        if id.trim().is_empty() {
            return Err(AppError::validation("User ID is required"));
        }

        let (deleted_tasks, deleted_notes, deleted_events, deleted_health) =
            self.db.with_transaction(|conn| {
                require_user(conn, id)?;
                let counts = (
                    TaskRepository::count_by_user(conn, id)?,
                    NoteRepository::count_by_user(conn, id)?,
                    UrgentEventRepository::count_by_user(conn, id)?,
                    HealthRepository::count_by_user(conn, id)?,
                );
                UserRepository::delete(conn, id)?;
                Ok(counts)
            })?;

        info!(
            user_id = %id,
            deleted_tasks,
            deleted_notes,
            deleted_events,
            deleted_health,
            "user deleted"
        );
        Ok(deleted_tasks)
    }

    pub fn user_stats(&self, id: &str) -> AppResult<UserTaskStats> {
        let rows = self.db.with_connection(|conn| {
            require_user(conn, id)?;
            TaskRepository::list_by_user(conn, id)
        })?;
        let tasks = rows
            .into_iter()
            .map(|row| row.into_record())
            .collect::<Vec<_>>();

        let patterns = analyze_task_patterns(&tasks);
        let count = |status: &str| patterns.tasks_by_status.get(status).copied().unwrap_or(0);

        let stats = UserTaskStats {
            total_tasks: patterns.total_tasks,
            pending_tasks: count(STATUS_PENDING),
            in_progress_tasks: count(STATUS_IN_PROGRESS),
            completed_tasks: count(STATUS_COMPLETED),
        };
        debug!(user_id = %id, total = stats.total_tasks, "user stats computed");
        Ok(stats)
    }

    fn get_record(&self, id: &str) -> AppResult<UserRecord> {
        let row = self
            .db
            .with_connection(|conn| UserRepository::find_by_id(conn, id))?
            .ok_or_else(|| AppError::not_found("user"))?;
        Ok(row.into_record())
    }
}

fn normalize_username(username: &str) -> AppResult<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Username is required"));
    }
    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(email: &str) -> AppResult<String> {
    let normalized = email.trim().to_lowercase();
    if !EMAIL_PATTERN.is_match(&normalized) {
        return Err(AppError::validation("Please enter a valid email address"));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::task_repository::TaskRow;
    use crate::models::task::TaskRecord;
    use tempfile::tempdir;

    fn setup_service() -> (UserService, tempfile::TempDir) {
        let dir = tempdir().expect("temp dir");
        let db_path = dir.path().join("users.sqlite");
        let pool = DbPool::new(db_path).expect("db pool");
        (UserService::new(pool), dir)
    }

    fn input(username: &str, email: &str) -> UserCreateInput {
        UserCreateInput {
            username: username.into(),
            password: "secret-pass".into(),
            email: email.into(),
        }
    }

    fn insert_task(service: &UserService, user_id: &str, status: &str) {
        let now = now_rfc3339();
        let record = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: "task".into(),
            description: "desc".into(),
            start_date: now.clone(),
            due_date: now.clone(),
            status: status.into(),
            estimated_time: None,
            actual_time: None,
            completed_at: None,
            user_id: user_id.into(),
            created_at: now.clone(),
            updated_at: now,
        };
        service
            .db
            .with_connection(|conn| TaskRepository::insert(conn, &TaskRow::from_record(&record)))
            .expect("insert task");
    }

    #[test]
    fn add_user_hides_password_and_normalizes_email() {
        let (service, _dir) = setup_service();
        let user = service
            .add_user(input("  alice ", "Alice@Example.COM"))
            .expect("add user");

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn add_user_requires_all_fields() {
        let (service, _dir) = setup_service();
        let result = service.add_user(UserCreateInput {
            username: "bob".into(),
            password: String::new(),
            email: "bob@example.com".into(),
        });
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn add_user_rejects_bad_email() {
        let (service, _dir) = setup_service();
        let result = service.add_user(input("bob", "not-an-email"));
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn duplicate_username_or_email_conflicts() {
        let (service, _dir) = setup_service();
        service.add_user(input("carol", "carol@example.com")).unwrap();

        let same_name = service.add_user(input("carol", "other@example.com"));
        assert!(matches!(same_name, Err(AppError::Conflict { .. })));

        let same_email = service.add_user(input("carol2", "CAROL@example.com"));
        assert!(matches!(same_email, Err(AppError::Conflict { .. })));
    }

    #[test]
    fn check_user_verifies_optional_password() {
        let (service, _dir) = setup_service();
        service.add_user(input("dave", "dave@example.com")).unwrap();

        assert_eq!(service.check_user("dave", None).unwrap().username, "dave");
        assert!(service.check_user("dave", Some("secret-pass")).is_ok());
        assert!(matches!(
            service.check_user("dave", Some("wrong")),
            Err(AppError::Validation { .. })
        ));
        assert!(service.check_user("nobody", None).unwrap_err().is_not_found());
        assert!(matches!(
            service.check_user("  ", None),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn update_user_checks_uniqueness_against_others_only() {
        let (service, _dir) = setup_service();
        let erin = service.add_user(input("erin", "erin@example.com")).unwrap();
        service.add_user(input("frank", "frank@example.com")).unwrap();

        let unchanged = service
            .update_user(
                &erin.id,
                UserUpdateInput {
                    username: Some("erin".into()),
                    email: None,
                },
            )
            .expect("self update");
        assert_eq!(unchanged.username, "erin");

        let clash = service.update_user(
            &erin.id,
            UserUpdateInput {
                username: None,
                email: Some("frank@example.com".into()),
            },
        );
        assert!(matches!(clash, Err(AppError::Conflict { .. })));

        let renamed = service
            .update_user(
                &erin.id,
                UserUpdateInput {
                    username: Some("erin2".into()),
                    email: Some(String::new()),
                },
            )
            .unwrap();
        assert_eq!(renamed.username, "erin2");
        assert_eq!(renamed.email, "erin@example.com");
    }

    #[test]
    fn delete_user_reports_cascaded_tasks() {
        let (service, _dir) = setup_service();
        let user = service.add_user(input("gina", "gina@example.com")).unwrap();
        insert_task(&service, &user.id, "pending");
        insert_task(&service, &user.id, "completed");

        let deleted = service.delete_user(&user.id).expect("delete");
        assert_eq!(deleted, 2);
        assert!(service.get_user(&user.id).unwrap_err().is_not_found());
        assert!(service.delete_user(&user.id).unwrap_err().is_not_found());
    }

    #[test]
    fn stats_count_each_status() {
        let (service, _dir) = setup_service();
        let user = service.add_user(input("hank", "hank@example.com")).unwrap();
        insert_task(&service, &user.id, "pending");
        insert_task(&service, &user.id, "in-progress");
        insert_task(&service, &user.id, "completed");
        insert_task(&service, &user.id, "completed");

        let stats = service.user_stats(&user.id).unwrap();
        assert_eq!(
            stats,
            UserTaskStats {
                total_tasks: 4,
                pending_tasks: 1,
                in_progress_tasks: 1,
                completed_tasks: 2,
            }
        );

        let with_tasks = service.get_user_with_tasks(&user.id).unwrap();
        assert_eq!(with_tasks.tasks_count, 4);
    }
}
