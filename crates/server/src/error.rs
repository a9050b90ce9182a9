use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr,
    models::{action::ActionError, task::TaskError, user::UserError},
};
use sea_orm::SqlErr;
use services::{auth::AuthError, points::PointsError};
use thiserror::Error;
use utils::response::ApiResponse;
use utils_jwt::TokenError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Points(#[from] PointsError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<&'static str> for ApiError {
    fn from(msg: &'static str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}

fn user_error_status(err: &UserError) -> StatusCode {
    match err {
        UserError::NotFound => StatusCode::NOT_FOUND,
        UserError::EmailTaken => StatusCode::CONFLICT,
        UserError::Database(db_err) => db_error_status(db_err),
    }
}

fn db_error_status(err: &DbErr) -> StatusCode {
    if matches!(err, DbErr::RecordNotFound(_)) {
        return StatusCode::NOT_FOUND;
    }
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return StatusCode::CONFLICT;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::User(err) => (user_error_status(err), "UserError"),
            ApiError::Task(err) => match err {
                TaskError::NotFound => (StatusCode::NOT_FOUND, "TaskError"),
                TaskError::Database(db_err) => (db_error_status(db_err), "TaskError"),
            },
            ApiError::Action(err) => match err {
                ActionError::NotFound | ActionError::UserNotFound | ActionError::TaskNotFound => {
                    (StatusCode::NOT_FOUND, "ActionError")
                }
                ActionError::Database(db_err) => (db_error_status(db_err), "ActionError"),
            },
            ApiError::Points(err) => match err {
                PointsError::User(user_err) => (user_error_status(user_err), "PointsError"),
                PointsError::Database(db_err) => (db_error_status(db_err), "PointsError"),
            },
            ApiError::Token(err) => match err {
                TokenError::Expired | TokenError::Invalid => {
                    (StatusCode::UNAUTHORIZED, "TokenError")
                }
                TokenError::Signing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TokenError"),
            },
            ApiError::Auth(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AuthError"),
            ApiError::Database(db_err) => (db_error_status(db_err), "DatabaseError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::InvalidState(_) => (StatusCode::BAD_REQUEST, "InvalidState"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        let error_message = match &self {
            ApiError::Unauthorized => "Unauthorized. Please sign in.".to_string(),
            ApiError::Forbidden(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::InvalidState(msg) => msg.clone(),
            ApiError::Conflict(msg) => msg.clone(),
            ApiError::Internal(msg) => msg.clone(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
