//! Middlewares for routes: the bearer-token pipeline.
//!
//! Stages run in a fixed order. `authenticate` stops after the session is
//! verified; `resolve_user` goes on to load the owning user and settle the
//! daily credit grants. Handlers receive the results as extensions.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::user::{self, User};

const BEARER: &str = "Bearer ";

/// Pull the opaque token out of the `Authorization` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER))
        .filter(|token| !token.is_empty())
        .ok_or(ServerError::Unauthorized)
}

/// Middleware for session-only routes: verify the token, expose it as an
/// extension. The owning user is not loaded and no credits move.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let now = Utc::now();
    let value = extract_bearer(req.headers())?;
    let token = state.tokens.verify(value, now).await?;

    req.extensions_mut().insert(token);
    Ok(next.run(req).await)
}

/// Middleware for protected routes: verify the token, resolve the owning
/// user, expose both as extensions.
///
/// `now` is sampled once so the expiry check and the grant decisions agree on
/// the date.
pub async fn resolve_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let now = Utc::now();
    let value = extract_bearer(req.headers())?;
    let token = state.tokens.verify(value, now).await?;
    let user = user::resolve(state.store.as_ref(), token.user_id, now).await?;

    req.extensions_mut().insert(token);
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Authorization stage for admin-only handlers.
pub fn require_admin(user: &User) -> Result<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ServerError::MissingPrivileges)
    }
}
