//! Current-user view.

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::user::User;

/// Public fields of a user row.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub credits: i64,
}

impl From<User> for Response {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
            credits: user.credits,
        }
    }
}

/// Handler returning the resolved user. The credit grants were already
/// settled by the middleware; this only reports the outcome.
pub async fn handler(Extension(user): Extension<User>) -> Json<Response> {
    Json(user.into())
}
