//! Incoming command models
//!
//! Body of `POST /command`, sent when a user messages the bot or presses
//! one of its buttons.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::user::ChatType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    User,
    System,
}

/// A command delivered to the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub sync_id: Uuid,
    #[serde(default)]
    pub source_sync_id: Option<Uuid>,
    pub command: CommandData,
    #[serde(default)]
    pub attachments: Vec<Value>,
    pub from: CommandFrom,
    #[serde(default)]
    pub async_files: Vec<Value>,
    pub bot_id: Uuid,
    #[serde(default)]
    pub proto_version: u32,
    #[serde(default)]
    pub entities: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandData {
    pub body: String,
    pub command_type: CommandType,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub metadata: Value,
}

/// Sender of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandFrom {
    #[serde(default)]
    pub user_huid: Option<Uuid>,
    #[serde(default)]
    pub group_chat_id: Option<Uuid>,
    #[serde(default)]
    pub chat_type: Option<ChatType>,
    #[serde(default)]
    pub ad_login: Option<String>,
    #[serde(default)]
    pub ad_domain: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub is_creator: Option<bool>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
}

/// Reply to `POST /command`.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    /// Command accepted for processing
    Accepted,
    /// Bot cannot process commands
    Disabled { status_message: String },
}

impl CommandResponse {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CommandResponse::Accepted => StatusCode::ACCEPTED,
            CommandResponse::Disabled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            CommandResponse::Accepted => json!({}),
            CommandResponse::Disabled { status_message } => json!({
                "reason": "bot_disabled",
                "error_data": { "status_message": status_message },
            }),
        }
    }
}
