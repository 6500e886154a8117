/// Task model and database operations
///
/// A task is a unit of work inside exactly one project. Its status moves
/// freely between the three workflow columns; there is no transition table
/// beyond membership in [`TaskStatus`].
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     due_date TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanbanflow_shared::models::task::{CreateTask, Task, TaskStatus};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask::new("Write changelog", project_id, user_id)).await?;
/// assert_eq!(task.status, TaskStatus::Pending);
///
/// Task::update_status(&pool, task.id, TaskStatus::InProgress).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Columns of a task row aliased `t` joined with its creator `c` and
/// optional assignee `a`
const TASK_PROJECTION: &str = r#"
    t.id, t.title, t.description, t.status, t.priority, t.project_id,
    t.assigned_to, a.username AS assigned_to_username,
    t.created_by, c.username AS created_by_username,
    t.created_at, t.updated_at, t.due_date
"#;

const TASK_JOINS: &str = r#"
    JOIN users c ON c.id = t.created_by
    LEFT JOIN users a ON a.id = t.assigned_to
"#;

/// A value outside an enumerated field's allowed choices
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{value}\" is not a valid choice")]
pub struct InvalidChoice {
    pub value: String,
}

/// Workflow column of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidChoice {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| InvalidChoice {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task joined with the display names of its creator and assignee
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    /// Free text, may be empty
    pub description: String,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Owning project
    pub project_id: Uuid,

    /// Assignee (cleared when that user is deleted)
    pub assigned_to: Option<Uuid>,

    /// Assignee's display name
    pub assigned_to_username: Option<String>,

    /// Creator (the task is deleted with them)
    pub created_by: Uuid,

    /// Creator's display name
    pub created_by_username: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: Uuid,
    pub assigned_to: Option<Uuid>,

    /// Resolved server-side from the caller identity
    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTask {
    /// A pending, medium-priority, unassigned task with no description
    pub fn new(title: impl Into<String>, project_id: Uuid, created_by: Uuid) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            project_id,
            assigned_to: None,
            created_by,
            due_date: None,
        }
    }
}

/// Partial update; only `Some` fields are written
///
/// `assigned_to` and `due_date` use `Some(None)` to clear the column.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Uuid>,
    pub assigned_to: Option<Option<Uuid>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Restricts a task listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks of this project
    pub project_id: Option<Uuid>,
}

impl Task {
    /// Inserts a task
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation (`tasks_project_id_fkey`,
    /// `tasks_assigned_to_fkey`, `tasks_created_by_fkey`) if a referenced row
    /// does not exist.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            WITH t AS (
                INSERT INTO tasks
                    (title, description, status, priority, project_id, assigned_to, created_by, due_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            )
            SELECT {TASK_PROJECTION} FROM t {TASK_JOINS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.project_id)
        .bind(data.assigned_to)
        .bind(data.created_by)
        .bind(data.due_date)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_PROJECTION} FROM tasks t {TASK_JOINS} WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists tasks matching `filter`, newest first
    ///
    /// Creator and assignee names come from the same query.
    pub async fn list(pool: &PgPool, filter: TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {TASK_PROJECTION} FROM tasks t {TASK_JOINS}");

        if filter.project_id.is_some() {
            query.push_str(" WHERE t.project_id = $1");
        }
        query.push_str(" ORDER BY t.created_at DESC, t.id DESC");

        let mut q = sqlx::query_as::<_, Task>(&query);
        if let Some(project_id) = filter.project_id {
            q = q.bind(project_id);
        }

        q.fetch_all(pool).await
    }

    /// Applies a partial update and refreshes `updated_at`
    ///
    /// Returns None if the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut assignments = String::from("updated_at = NOW()");
        let mut bind_count = 1;

        let mut column = |name: &str, present: bool| {
            if present {
                bind_count += 1;
                assignments.push_str(&format!(", {name} = ${bind_count}"));
            }
        };
        column("title", data.title.is_some());
        column("description", data.description.is_some());
        column("status", data.status.is_some());
        column("priority", data.priority.is_some());
        column("project_id", data.project_id.is_some());
        column("assigned_to", data.assigned_to.is_some());
        column("due_date", data.due_date.is_some());

        let query = format!(
            r#"
            WITH t AS (
                UPDATE tasks SET {assignments}
                WHERE id = $1
                RETURNING *
            )
            SELECT {TASK_PROJECTION} FROM t {TASK_JOINS}
            "#
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(project_id) = data.project_id {
            q = q.bind(project_id);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        q.fetch_optional(pool).await
    }

    /// Moves a task to `status` and refreshes `updated_at`
    ///
    /// Any status may follow any other. Returns None if the task does not
    /// exist.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            WITH t AS (
                UPDATE tasks
                SET status = $2,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {TASK_PROJECTION} FROM t {TASK_JOINS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts the tasks of a project
    pub async fn count_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_task_status_parses_every_choice() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_task_status_rejects_unknown_values() {
        for raw in ["bogus", "", "PENDING", "in progress", "done", " pending"] {
            let err = raw.parse::<TaskStatus>().unwrap_err();
            assert_eq!(err.value, raw);
        }
    }

    #[test]
    fn test_task_priority_parse() {
        assert_eq!("low".parse::<TaskPriority>(), Ok(TaskPriority::Low));
        assert_eq!("high".parse::<TaskPriority>(), Ok(TaskPriority::High));
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(
            serde_json::to_value(TaskPriority::High).unwrap(),
            serde_json::json!("high")
        );
    }

    #[test]
    fn test_invalid_choice_message() {
        let err = "bogus".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.to_string(), "\"bogus\" is not a valid choice");
    }

    #[test]
    fn test_create_task_new_defaults() {
        let data = CreateTask::new("T1", Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(data.status, TaskStatus::Pending);
        assert_eq!(data.priority, TaskPriority::Medium);
        assert!(data.assigned_to.is_none());
        assert!(data.description.is_empty());
    }
}
