use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::Result;
use crate::token::Token;

/// Handler to revoke the presented session token. Other sessions of the same
/// user stay valid.
pub async fn handler(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
) -> Result<StatusCode> {
    state.tokens.revoke(&token.token).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
pub(super) mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    use crate::router::login::tests::{FORM, credentials};
    use crate::store::AuthStore;
    use crate::*;

    async fn login(app: axum::Router) -> String {
        let response = make_request(
            app,
            Method::POST,
            "/auth/token",
            None,
            FORM,
            credentials("user@example.com", "s3cure-pass"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: router::login::Response = serde_json::from_slice(&body).unwrap();
        body.access_token
    }

    #[tokio::test]
    async fn test_logout_handler() {
        let (state, store) = router::state();
        let app = app(state.clone());
        router::seed_user(&state, &store, 1, "user@example.com", "s3cure-pass");

        let token = login(app.clone()).await;

        let response = make_request(
            app.clone(),
            Method::DELETE,
            "/auth/logout",
            Some(&token),
            FORM,
            String::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(store.token_by_value(&token).await.unwrap(), None);

        // The revoked token no longer authenticates.
        let response = make_request(
            app,
            Method::DELETE,
            "/auth/logout",
            Some(&token),
            FORM,
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_spares_other_sessions() {
        let (state, store) = router::state();
        let app = app(state.clone());
        router::seed_user(&state, &store, 1, "user@example.com", "s3cure-pass");

        let first = login(app.clone()).await;
        let second = login(app.clone()).await;

        let response = make_request(
            app,
            Method::DELETE,
            "/auth/logout",
            Some(&first),
            FORM,
            String::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(store.token_by_value(&first).await.unwrap(), None);
        assert!(store.token_by_value(&second).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logout_without_token() {
        let (state, _) = router::state();
        let app = app(state);

        let response = make_request(
            app,
            Method::DELETE,
            "/auth/logout",
            None,
            FORM,
            String::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
