//! Staff task CRUD.

use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use swimdesk_core::TaskId;
use swimdesk_core::status::TaskStatus;
use uuid::Uuid;

/// A staff task.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Task {
    /// Identifier.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub details: Option<String>,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new task.
#[derive(Clone, Debug)]
pub struct NewTask {
    /// Short title.
    pub title: String,
    /// Longer description.
    pub details: Option<String>,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New details.
    pub details: Option<String>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    details: Option<String>,
    status: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            title: row.title,
            details: row.details,
            status: row.status.parse().map_err(StoreError::InvalidStatus)?,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TASK_COLUMNS: &str = "id, title, details, status, due_date, created_at, updated_at";

/// Store for tasks.
#[derive(Clone)]
pub struct TaskStore {
    pool: PgPool,
}

impl TaskStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown.
    pub async fn get(&self, id: TaskId) -> Result<Task, StoreError> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(StoreError::NotFound("task"))?.try_into()
    }

    /// Lists every task, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY updated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on insert failure.
    pub async fn create(&self, task: &NewTask) -> Result<Task, StoreError> {
        let id = TaskId::new();
        let row: TaskRow = sqlx::query_as(&format!(
            "INSERT INTO tasks (id, title, details, due_date) VALUES ($1, $2, $3, $4) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&task.title)
        .bind(task.details.as_deref())
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown.
    pub async fn patch(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "UPDATE tasks SET \
                 title = COALESCE($2, title), \
                 details = COALESCE($3, details), \
                 status = COALESCE($4, status), \
                 due_date = COALESCE($5, due_date), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(patch.title.as_deref())
        .bind(patch.details.as_deref())
        .bind(patch.status.map(TaskStatus::as_str))
        .bind(patch.due_date)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(StoreError::NotFound("task"))?.try_into()
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown.
    pub async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("task"));
        }
        Ok(())
    }
}
