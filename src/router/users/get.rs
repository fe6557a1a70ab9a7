//! Admin view of any user.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::middleware::require_admin;
use crate::user::{User, UserId};

use super::me::Response;

/// Handler for admins to inspect an arbitrary user row.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Extension(current): Extension<User>,
) -> Result<Json<Response>> {
    require_admin(&current)?;

    let user = state
        .store
        .user_by_id(user_id)
        .await?
        .ok_or(ServerError::UnknownUser)?;

    Ok(Json(user.into()))
}
