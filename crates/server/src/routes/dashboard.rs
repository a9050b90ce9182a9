use axum::{
    Extension, Router,
    extract::{Query, State},
    middleware::{from_fn, from_fn_with_state},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::user::User;
use serde::Deserialize;
use services::stats::{self, AdminDashboard, LeaderboardEntry, SystemOverview, UserDashboard};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, http::auth as http_auth};

const DEFAULT_LEADERBOARD_LIMIT: u64 = 10;
const MAX_LEADERBOARD_LIMIT: u64 = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u64>,
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<LeaderboardEntry>>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);
    let entries = stats::leaderboard(&state.db().pool, limit).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

pub async fn get_overview(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<SystemOverview>>, ApiError> {
    let overview = stats::system_overview(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(overview)))
}

pub async fn get_user_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<UserDashboard>>, ApiError> {
    let dashboard = stats::user_dashboard(&state.db().pool, &user).await?;
    Ok(ResponseJson(ApiResponse::success(dashboard)))
}

pub async fn get_admin_dashboard(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<AdminDashboard>>, ApiError> {
    let dashboard = stats::admin_dashboard(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(dashboard)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let auth_layer = from_fn_with_state(state.clone(), http_auth::require_auth);
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/dashboard/overview", get(get_overview))
        .route(
            "/dashboard/user",
            get(get_user_dashboard).layer(auth_layer.clone()),
        )
        .route(
            "/dashboard/admin",
            get(get_admin_dashboard)
                .layer(from_fn(http_auth::require_admin))
                .layer(auth_layer),
        )
}
