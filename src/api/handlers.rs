//! Webhook Handlers
//!
//! HTTP request handlers for each endpoint the platform calls.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::bot::Bot;
use crate::error::WebhookError;
use crate::models::{
    CommandRequest, CommandResponse, NotificationCallback, StatusRequest, StatusResponse,
};

/// Handler for POST /notification/callback
///
/// Hands the result to whoever awaits its sync id, or buffers it.
pub async fn notification_callback_handler(
    State(bot): State<Arc<Bot>>,
    payload: Result<Json<NotificationCallback>, JsonRejection>,
) -> Result<StatusCode, WebhookError> {
    let Json(callback) = payload.map_err(|e| WebhookError::BadRequest(e.body_text()))?;

    debug!(
        "Notification callback {} with status {}",
        callback.sync_id, callback.status
    );
    bot.deliver_callback(callback);

    Ok(StatusCode::ACCEPTED)
}

/// Handler for GET /status
///
/// Returns the bot menu for the requesting user.
pub async fn status_handler(
    State(bot): State<Arc<Bot>>,
    query: Result<Query<StatusRequest>, QueryRejection>,
) -> Result<Json<StatusResponse>, WebhookError> {
    let Query(request) = query.map_err(|e| WebhookError::BadRequest(e.body_text()))?;

    if request.bot_id != bot.id() {
        return Err(WebhookError::ForeignBot {
            kind: "status",
            bot_id: request.bot_id,
        });
    }

    let response = bot
        .status_for(&request)
        .unwrap_or_else(StatusResponse::disabled);
    Ok(Json(response))
}

/// Handler for POST /command
///
/// Accepts the command and runs the user handler in the background.
pub async fn command_handler(
    State(bot): State<Arc<Bot>>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Response, WebhookError> {
    let Json(request) = payload.map_err(|e| WebhookError::BadRequest(e.body_text()))?;

    if request.bot_id != bot.id() {
        return Err(WebhookError::ForeignBot {
            kind: "command",
            bot_id: request.bot_id,
        });
    }

    let response = match bot.spawn_command(request) {
        true => CommandResponse::Accepted,
        false => {
            info!("Command received but no command handler is installed");
            CommandResponse::Disabled {
                status_message: "callback not implemented".to_string(),
            }
        }
    };

    Ok((response.status_code(), Json(response.body())).into_response())
}
