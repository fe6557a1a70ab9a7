//! authd is an opaque bearer-token authentication API with daily credit
//! grants.

#![forbid(unsafe_code)]

pub mod crypto;
pub mod error;
mod middleware;
mod router;
pub mod store;
pub mod telemetry;
pub mod token;
pub mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, header};
use axum::routing::{delete, get, post};
use axum::{Router, middleware as AxumMiddleware};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    bearer: Option<&str>,
    content_type: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(builder.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub store: Arc<dyn store::AuthStore>,
    pub crypto: Arc<crypto::PasswordManager>,
    pub tokens: token::TokenManager,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let session_router = Router::new()
        // `DELETE /auth/logout` goes to `logout`. Valid session required,
        // but the user row is never touched.
        .route("/logout", delete(router::logout::handler))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    let auth_router = Router::new()
        // `POST /auth/token` goes to `login`.
        .route("/token", post(router::login::handler))
        .merge(session_router);

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .nest("/auth", auth_router)
        .nest("/users", router::users::router(state.clone()))
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read();

    let crypto = Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    let store: Arc<dyn store::AuthStore> = match config.postgres {
        Some(ref postgres) => {
            let store = store::PgStore::connect(postgres).await?;

            // execute migrations scripts on start.
            sqlx::migrate!().run(store.pool()).await?;

            Arc::new(store)
        },
        None => {
            tracing::warn!(
                "missing `postgres` entry on `config.yaml` file, \
                 falling back to the in-memory store"
            );
            Arc::new(store::MemStore::new())
        },
    };

    let tokens = token::TokenManager::new(
        Arc::clone(&store),
        config.token.max_age_minutes,
    );

    Ok(AppState {
        config,
        store,
        crypto,
        tokens,
    })
}
