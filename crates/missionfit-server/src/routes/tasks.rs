use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use missionfit_core::task::{NewTask, Task};

use super::json_body;
use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct DeleteTaskBody {
    pub id: String,
}

/// GET /api/tasks: every task in insertion order.
pub async fn list_tasks(State(app): State<AppState>) -> Result<Json<Vec<Task>>, AppError> {
    let store = app.store.clone();
    let tasks = tokio::task::spawn_blocking(move || store.list())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;
    Ok(Json(tasks))
}

/// POST /api/tasks: create a task; the id is always assigned here.
pub async fn create_task(
    State(app): State<AppState>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let new = json_body(body)?;
    let store = app.store.clone();
    let task = tokio::task::spawn_blocking(move || store.create(new))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    tracing::debug!(id = %task.id, "task created");
    Ok(Json(task))
}

/// PUT /api/tasks: replace a task wholesale, matched by id.
pub async fn update_task(
    State(app): State<AppState>,
    body: Result<Json<Task>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let task = json_body(body)?;
    let store = app.store.clone();
    let task = tokio::task::spawn_blocking(move || store.update(task))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(task))
}

/// DELETE /api/tasks: remove a task by id. Unknown ids still succeed.
pub async fn delete_task(
    State(app): State<AppState>,
    body: Result<Json<DeleteTaskBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let DeleteTaskBody { id } = json_body(body)?;
    let store = app.store.clone();
    tokio::task::spawn_blocking(move || store.delete(&id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::json!({ "success": true })))
}
