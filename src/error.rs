//! Error handler for authd.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("User does not exist")]
    UnknownUser,

    #[error("Passwords do not match")]
    WrongPassword,

    #[error("Token invalid or expired")]
    InvalidToken,

    #[error("Missing or invalid 'Authorization' header")]
    Unauthorized,

    #[error("Account is not activated")]
    Inactive,

    #[error("Not authorized. admin privileges required")]
    MissingPrivileges,

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    #[serde(skip)]
    bearer: bool,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Add a `WWW-Authenticate: Bearer` challenge to the response.
    pub fn bearer(mut self) -> Self {
        self.bearer = true;
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            let mut builder = Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json");

            if self.bearer {
                builder = builder.header(header::WWW_AUTHENTICATE, "Bearer");
            }

            builder.body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            bearer: false,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("Authentication failed.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::UnknownUser => response.bearer(),

            ServerError::WrongPassword | ServerError::InvalidToken | ServerError::Unauthorized => {
                response.status(StatusCode::UNAUTHORIZED).bearer()
            }

            ServerError::Inactive | ServerError::MissingPrivileges => {
                response.status(StatusCode::FORBIDDEN).bearer()
            }

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "store request failed");

                ResponseError::default()
            }

            ServerError::Internal { details, source } => {
                tracing::error!(source = ?source, %details, "server returned 500 status");

                ResponseError::default()
            }
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
