//! Users-related HTTP API.
mod get;
mod me;

use axum::routing::get;
use axum::{Router, middleware};

use crate::AppState;
use crate::middleware::resolve_user;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /users/@me` goes to `me`. Authorization required.
        .route("/@me", get(me::handler))
        // `GET /users/{user_id}` goes to `get`. Admin privileges required.
        .route("/{user_id}", get(get::handler))
        .route_layer(middleware::from_fn_with_state(state, resolve_user))
}
