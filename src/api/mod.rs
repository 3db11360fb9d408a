//! API Module
//!
//! Webhook endpoints the platform calls on the bot.
//!
//! # Endpoints
//! - `GET /status` - Bot menu for a user
//! - `POST /command` - Incoming command
//! - `POST /notification/callback` - Result of an earlier notification

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{require_bot_jwt, validate_webhook_token};
pub use routes::create_router;
