//! Error types for the bot client
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::NotificationCallback;

// == Callback Error Enum ==
/// Outcome of awaiting a callback other than a successful result.
#[derive(Error, Debug)]
pub enum CallbackError<R: fmt::Debug> {
    /// Neither a buffered result nor a timely delivery was found
    #[error("timeout waiting for callback {0}")]
    Timeout(Uuid),

    /// The delivered result reports a non-success status
    #[error("callback {sync_id} failed: {reason}")]
    Failed {
        sync_id: Uuid,
        reason: String,
        result: Box<R>,
    },

    /// Another caller is already waiting on this sync id
    #[error("callback {0} is already awaited")]
    AlreadyAwaited(Uuid),
}

impl<R: fmt::Debug> CallbackError<R> {
    /// Returns true for [`CallbackError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallbackError::Timeout(_))
    }

    /// Returns the delivered result carried by a failure, if any.
    pub fn into_result(self) -> Option<R> {
        match self {
            CallbackError::Failed { result, .. } => Some(*result),
            _ => None,
        }
    }
}

// == Bot Error Enum ==
/// Unified error type for SDK operations.
#[derive(Error, Debug)]
pub enum BotError {
    /// Credentials string could not be parsed
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Request could not be built from the given input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-ok status
    #[error("API error (HTTP {status_code}): {reason}")]
    Api { status_code: u16, reason: String },

    /// Response payload did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Awaiting a notification callback failed
    #[error(transparent)]
    Callback(#[from] CallbackError<NotificationCallback>),

    /// The bot was created outside a Tokio runtime
    #[error("bot must be created inside a Tokio runtime")]
    NoRuntime,

    /// A synchronous send was requested before the webhook router was built
    #[error("bot is not configured to handle callbacks")]
    CallbacksNotConfigured,
}

// == Result Type Alias ==
/// Convenience Result type for SDK operations.
pub type Result<T> = std::result::Result<T, BotError>;

// == Webhook Error Enum ==
/// Errors returned to the platform by the webhook endpoints.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Request failed bearer-token authentication
    #[error("{0}")]
    Unauthorized(String),

    /// Request body or query could not be parsed
    #[error("{0}")]
    BadRequest(String),

    /// Request addressed a different bot
    #[error("{kind} requested for different bot id {bot_id}")]
    ForeignBot { kind: &'static str, bot_id: Uuid },
}

// == IntoResponse Implementation ==
impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::Unauthorized(_) => StatusCode::FORBIDDEN,
            WebhookError::BadRequest(_) | WebhookError::ForeignBot { .. } => {
                StatusCode::BAD_REQUEST
            }
        };

        let body = Json(json!({
            "status": "error",
            "reason": self.to_string(),
        }));

        (status, body).into_response()
    }
}
