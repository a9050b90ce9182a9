use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::{CreateUser, User};
use serde::{Deserialize, Serialize};
use services::{auth, stats};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, http::auth as http_auth};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserPoints {
    pub points: i64,
    pub rank: Option<u32>,
    pub streak_days: u32,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    let password_hash = auth::hash_password(&payload.password)?;
    let user = User::create(&state.db().pool, &payload, password_hash).await?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let Some((user, password_hash)) =
        User::credentials_by_email(&state.db().pool, &payload.email).await?
    else {
        return Err(ApiError::Unauthorized);
    };
    if !auth::verify_password(&payload.password, &password_hash)? {
        return Err(ApiError::Unauthorized);
    }

    let access_token = state.jwt().issue(user.id)?;
    Ok(ResponseJson(ApiResponse::success(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user,
    })))
}

pub async fn get_me(Extension(user): Extension<User>) -> ResponseJson<ApiResponse<User>> {
    ResponseJson(ApiResponse::success(user))
}

pub async fn get_points(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<ResponseJson<ApiResponse<UserPoints>>, ApiError> {
    let pool = &state.db().pool;
    Ok(ResponseJson(ApiResponse::success(UserPoints {
        points: user.points,
        rank: stats::rank_of(pool, user.id).await?,
        streak_days: stats::streak_days(pool, user.id).await?,
    })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let auth_layer = from_fn_with_state(state.clone(), http_auth::require_auth);
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/user/me", get(get_me).layer(auth_layer.clone()))
        .route("/user/points", get(get_points).layer(auth_layer))
}
