use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{
    models::task::{CreateTask, Task},
    types::TaskCategory,
};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, http::auth as http_auth, middleware::load_task_middleware};

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub category: Option<String>,
    pub date: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let category = match query.category.as_deref() {
        // an unknown category matches nothing rather than erroring
        Some(raw) => match raw.parse::<TaskCategory>() {
            Ok(category) => Some(category),
            Err(_) => return Ok(ResponseJson(ApiResponse::success(Vec::new()))),
        },
        None => None,
    };

    let tasks = Task::find_filtered(&state.db().pool, category, query.date.as_deref()).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(Extension(task): Extension<Task>) -> ResponseJson<ApiResponse<Task>> {
    ResponseJson(ApiResponse::success(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    let task = Task::create(&state.db().pool, &payload).await?;
    tracing::info!(task_id = %task.id, category = %task.category, date = %task.date, "task created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks))
        .route(
            "/tasks",
            post(create_task)
                .layer(from_fn(http_auth::require_admin))
                .layer(from_fn_with_state(state.clone(), http_auth::require_auth)),
        )
        .route(
            "/tasks/{task_id}",
            get(get_task).layer(from_fn_with_state(state.clone(), load_task_middleware)),
        )
}
