use axum::{
    Extension,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use db::{models::user::User, types::UserRole};

use crate::{AppState, error::ApiError};

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Verifies the bearer token and loads the authenticated user into request
/// extensions. Downstream handlers take `Extension<User>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt().verify(token)?;
    let user = User::find_by_id(&state.db().pool, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Must sit inside `require_auth` so the user extension is present.
pub async fn require_admin(
    Extension(user): Extension<User>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if user.role != UserRole::Admin {
        tracing::warn!(
            user_id = %user.id,
            path = %req.uri().path(),
            "non-admin request to admin endpoint"
        );
        return Err(ApiError::Forbidden("Admin privileges required".to_string()));
    }
    Ok(next.run(req).await)
}
