use std::net::SocketAddr;

use axum::{
    Extension, Json, Router,
    extract::{ConnectInfo, Query, Request, State},
    http::{StatusCode, header},
    middleware::{Next, from_fn, from_fn_with_state},
    response::{Json as ResponseJson, Response},
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use db::{
    TransactionTrait,
    models::{
        action::{Action, ActionError, ActionFilter, CreateAction, UpdateAction},
        task::{Task, TaskError},
        user::User,
    },
    types::{ActionStatus, UserRole},
};
use serde::Deserialize;
use services::stats::{self, UserActionStats};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, http::auth as http_auth, middleware::load_action_middleware};

/// Peer address and user agent captured for the check-in audit fields.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub device_info: Option<String>,
}

async fn capture_client_meta(mut req: Request, next: Next) -> Response {
    let ip_address = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.ip().to_string());
    let device_info = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    req.extensions_mut().insert(ClientMeta {
        ip_address,
        device_info,
    });
    next.run(req).await
}

#[derive(Debug, Deserialize)]
pub struct ActionListQuery {
    pub task_id: Option<Uuid>,
    pub status: Option<ActionStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AdminActionQuery {
    pub user_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub status: Option<ActionStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Check-in: validates the task is scheduled for today and not yet checked
/// in, then records the action and awards points in one transaction.
pub async fn create_action(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(meta): Extension<ClientMeta>,
    Json(payload): Json<CreateAction>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Action>>), ApiError> {
    let pool = &state.db().pool;

    let task = Task::find_by_id(pool, payload.task_id)
        .await?
        .ok_or(TaskError::NotFound)?;
    let today = Utc::now().date_naive().to_string();
    if task.date != today {
        return Err(ApiError::InvalidState(format!(
            "Task is scheduled for {}, not today",
            task.date
        )));
    }
    if Action::exists_for_user_task(pool, user.id, task.id).await? {
        return Err(ApiError::Conflict(
            "Already checked in on this task".to_string(),
        ));
    }

    // The unique (user, task) index closes the race left open by the check
    // above; a concurrent insert surfaces as Conflict via the error mapping.
    let tx = pool.begin().await?;
    let created = Action::create(
        &tx,
        user.id,
        &payload,
        meta.ip_address.clone(),
        meta.device_info.clone(),
    )
    .await?;
    state.points().award(&tx, &user, &task, None).await?;
    let action = Action::find_by_id(&tx, created.id)
        .await?
        .ok_or(ActionError::NotFound)?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        task_id = %task.id,
        points_earned = action.points_earned,
        "check-in recorded"
    );
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(action)),
    ))
}

pub async fn list_actions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ActionListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Action>>>, ApiError> {
    let filter = ActionFilter {
        user_id: Some(user.id),
        task_id: query.task_id,
        status: query.status,
        start: query.start_date,
        end: query.end_date,
    };
    let actions = Action::find_filtered(&state.db().pool, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(actions)))
}

pub async fn action_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<UserActionStats>>, ApiError> {
    let stats = stats::user_action_stats(&state.db().pool, &user).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub async fn get_action(
    Extension(user): Extension<User>,
    Extension(action): Extension<Action>,
) -> Result<ResponseJson<ApiResponse<Action>>, ApiError> {
    if action.user_id != user.id && user.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Check-in belongs to another user".to_string(),
        ));
    }
    Ok(ResponseJson(ApiResponse::success(action)))
}

/// Admin correction. A changed `points_earned` applies its delta to the
/// user's cumulative total in the same transaction.
pub async fn update_action(
    State(state): State<AppState>,
    Extension(action): Extension<Action>,
    Json(payload): Json<UpdateAction>,
) -> Result<ResponseJson<ApiResponse<Action>>, ApiError> {
    let pool = &state.db().pool;

    let tx = pool.begin().await?;
    let updated = Action::update(&tx, action.id, &payload).await?;
    if let Some(points_earned) = payload.points_earned {
        let delta = points_earned - action.points_earned;
        if delta != 0 {
            User::add_points(&tx, action.user_id, delta).await?;
        }
    }
    tx.commit().await?;

    tracing::info!(action_id = %action.id, "check-in updated");
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn admin_list_actions(
    State(state): State<AppState>,
    Query(query): Query<AdminActionQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Action>>>, ApiError> {
    let filter = ActionFilter {
        user_id: query.user_id,
        task_id: query.task_id,
        status: query.status,
        start: query.start_date,
        end: query.end_date,
    };
    let actions = Action::find_filtered(&state.db().pool, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(actions)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let load_action = from_fn_with_state(state.clone(), load_action_middleware);
    Router::new()
        .route("/actions", post(create_action).layer(from_fn(capture_client_meta)))
        .route("/actions", get(list_actions))
        .route("/actions/stats", get(action_stats))
        .route(
            "/actions/{action_id}",
            get(get_action).layer(load_action.clone()),
        )
        .route(
            "/actions/{action_id}",
            patch(update_action)
                .layer(load_action)
                .layer(from_fn(http_auth::require_admin)),
        )
        .route(
            "/admin/actions",
            get(admin_list_actions).layer(from_fn(http_auth::require_admin)),
        )
        .layer(from_fn_with_state(state.clone(), http_auth::require_auth))
}
