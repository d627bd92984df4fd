//! Session check for protected routes

use auth::models::SessionToken;
use axum::{
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, state::AppState};

/// Reject the request unless it carries the bearer token of a live session.
///
/// The token and its session are inserted into the request extensions for
/// handlers that need them.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("Login required".to_string()))?;

    let session = state
        .sessions
        .current_user(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Login required".to_string()))?;

    req.extensions_mut().insert(token);
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Session token from an `Authorization: Bearer <token>` header
fn bearer_token<B>(req: &Request<B>) -> Option<SessionToken> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| token.parse().ok())
}
