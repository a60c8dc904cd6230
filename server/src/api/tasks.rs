//! Staff task endpoints.
//!
//! - GET /api/tasks - List tasks
//! - POST /api/tasks - Create a task
//! - GET /api/tasks/:id - Get one task
//! - PATCH /api/tasks/:id - Partially update a task
//! - DELETE /api/tasks/:id - Delete a task
//!
//! All task endpoints require a staff session.

use crate::auth::middleware::RequireStaff;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use swimdesk_core::TaskId;
use swimdesk_core::status::TaskStatus;
use swimdesk_postgres::tasks::{NewTask, Task, TaskPatch};

/// Response for listing tasks.
#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    /// Tasks, most recently updated first.
    pub tasks: Vec<Task>,
}

/// Lists every task.
pub async fn list_tasks(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
) -> Result<Json<ListTasksResponse>, AppError> {
    let tasks = state.tasks.list().await?;
    Ok(Json(ListTasksResponse { tasks }))
}

/// Request to create a task.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Short title.
    pub title: String,
    /// Longer description.
    pub details: Option<String>,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
}

/// Creates a task.
pub async fn create_task(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    let task = state
        .tasks
        .create(&NewTask {
            title: request.title,
            details: request.details,
            due_date: request.due_date,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Fetches one task.
pub async fn get_task(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(id): Path<TaskId>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(state.tasks.get(id).await?))
}

/// Request to partially update a task.
#[derive(Debug, Default, Deserialize)]
pub struct PatchTaskRequest {
    /// New title.
    pub title: Option<String>,
    /// New details.
    pub details: Option<String>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
}

/// Applies a partial update; absent fields are left untouched.
pub async fn patch_task(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(id): Path<TaskId>,
    Json(request): Json<PatchTaskRequest>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .tasks
        .patch(
            id,
            &TaskPatch {
                title: request.title,
                details: request.details,
                status: request.status,
                due_date: request.due_date,
            },
        )
        .await?;
    Ok(Json(task))
}

/// Deletes a task.
pub async fn delete_task(
    State(state): State<AppState>,
    RequireStaff(_): RequireStaff,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
