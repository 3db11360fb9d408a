//! Webhook Routes
//!
//! Configures the Axum router with the endpoints the platform calls.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::auth::require_bot_jwt;
use super::handlers::{command_handler, notification_callback_handler, status_handler};
use crate::bot::Bot;

/// Creates the webhook router for `bot`.
///
/// # Endpoints
/// - `GET /status` - Bot menu for a user
/// - `POST /command` - Incoming command
/// - `POST /notification/callback` - Result of an earlier notification
///
/// Every endpoint requires a bot JWT in the `Authorization` header.
pub fn create_router(bot: Arc<Bot>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/command", post(command_handler))
        .route("/notification/callback", post(notification_callback_handler))
        .layer(middleware::from_fn_with_state(bot.clone(), require_bot_jwt))
        .layer(TraceLayer::new_for_http())
        .with_state(bot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotOptions;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let bot = Bot::from_credentials(
            "127.0.0.1:1@secret@8dada2c8-67a6-4434-9dec-570d244e78ee",
            BotOptions::default(),
        )
        .unwrap();
        bot.router()
    }

    #[tokio::test]
    async fn test_status_requires_token() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_wrong_auth_scheme() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/notification/callback")
                    .header("authorization", "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_route_still_requires_token() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
