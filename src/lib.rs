//! BotX Client - SDK for writing bots on the BotX platform
//!
//! Provides the platform API client, TTL lookup caches, the webhook router
//! and synchronous sends built on callback correlation.

pub mod api;
pub mod bot;
pub mod cache;
pub mod callbacks;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
mod tasks;

pub use bot::Bot;
pub use cache::KvCache;
pub use callbacks::{CallbackResult, Correlator};
pub use config::{BotOptions, Config};
pub use error::{BotError, CallbackError, Result, WebhookError};
