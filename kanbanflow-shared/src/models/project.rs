/// Project model and database operations
///
/// A project is a named container for tasks with one owner and a member set.
/// Reads always return the owner's and members' display names alongside the
/// raw owner ID, so callers never issue per-row user lookups.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanbanflow_shared::models::project::{CreateProject, Project};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid) -> Result<(), sqlx::Error> {
/// let project = Project::create(&pool, CreateProject {
///     name: "Website relaunch".to_string(),
///     description: String::new(),
///     owner_id,
/// }).await?;
///
/// assert!(project.members.is_empty());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Selects a project joined with its owner's and members' usernames from a
/// relation aliased `p`
const PROJECT_PROJECTION: &str = r#"
    p.id, p.name, p.description, p.owner_id,
    o.username AS owner,
    ARRAY(
        SELECT u.username::text
        FROM project_members pm
        JOIN users u ON u.id = pm.user_id
        WHERE pm.project_id = p.id
        ORDER BY u.username
    ) AS members,
    p.created_at, p.updated_at
"#;

/// A project with its related users rendered as display names
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    /// Free text, may be empty
    pub description: String,

    /// Owning user (immutable after creation)
    pub owner_id: Uuid,

    /// Owner's display name
    pub owner: String,

    /// Members' display names, sorted
    pub members: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: String,

    /// Resolved server-side from the caller identity
    pub owner_id: Uuid,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Project {
    /// Inserts a project with no members
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if `owner_id` does not exist.
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            WITH p AS (
                INSERT INTO projects (name, description, owner_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {PROJECT_PROJECTION}
            FROM p JOIN users o ON o.id = p.owner_id
            "#
        ))
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_PROJECTION}
            FROM projects p JOIN users o ON o.id = p.owner_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists every project, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_PROJECTION}
            FROM projects p JOIN users o ON o.id = p.owner_id
            ORDER BY p.created_at DESC, p.id DESC
            "#
        ))
        .fetch_all(pool)
        .await
    }

    /// Applies a partial update and refreshes `updated_at`
    ///
    /// Returns None if the project does not exist. An empty update still
    /// touches `updated_at`.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut assignments = String::from("updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            assignments.push_str(&format!(", name = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            assignments.push_str(&format!(", description = ${bind_count}"));
        }

        let query = format!(
            r#"
            WITH p AS (
                UPDATE projects SET {assignments}
                WHERE id = $1
                RETURNING *
            )
            SELECT {PROJECT_PROJECTION}
            FROM p JOIN users o ON o.id = p.owner_id
            "#
        );

        let mut q = sqlx::query_as::<_, Project>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a project
    ///
    /// ⚠️ Cascades to every task of the project and to its memberships.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds a member; adding an existing member is a no-op
    ///
    /// Returns true if a new membership row was written.
    pub async fn add_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a member
    pub async fn remove_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
