use axum::Json;
use axum::extract::{Form, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};

pub const TOKEN_TYPE: &str = "bearer";

/// Form-encoded credentials, OAuth2 password-grant style.
#[derive(Debug, Serialize, Deserialize)]
pub struct Body {
    pub username: String,
    pub password: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub access_token: String,
    pub token_type: String,
}

/// Handler to exchange credentials for a session token.
///
/// An unknown email and a wrong password answer differently on purpose: the
/// API reports which of the two failed.
pub async fn handler(
    State(state): State<AppState>,
    Form(body): Form<Body>,
) -> Result<Json<Response>> {
    let user = state
        .store
        .user_by_email(&body.username)
        .await?
        .ok_or(ServerError::UnknownUser)?;

    if !state
        .crypto
        .verify_password(&body.password, &user.password_hash)
    {
        return Err(ServerError::WrongPassword);
    }

    if !user.is_active {
        return Err(ServerError::Inactive);
    }

    let token = state.tokens.issue(user.id, Utc::now()).await?;

    Ok(Json(Response {
        access_token: token.token,
        token_type: TOKEN_TYPE.to_owned(),
    }))
}
