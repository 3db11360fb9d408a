//! Bot status callback models
//!
//! The platform asks `GET /status` which commands a bot offers to a user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::ChatType;
use super::STATUS_OK;

/// Query parameters of `GET /status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusRequest {
    pub bot_id: Uuid,
    pub user_huid: Uuid,
    #[serde(default)]
    pub ad_login: Option<String>,
    #[serde(default)]
    pub ad_domain: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub chat_type: ChatType,
}

/// Reply to `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub result: StatusResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResult {
    pub enabled: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status_message: String,
    pub commands: Vec<BotCommand>,
}

/// A command advertised in the bot menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotCommand {
    pub description: String,
    pub body: String,
    pub name: String,
}

impl StatusResponse {
    pub fn new(enabled: bool, status_message: impl Into<String>, commands: Vec<BotCommand>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            result: StatusResult {
                enabled,
                status_message: status_message.into(),
                commands,
            },
        }
    }

    /// Reply used when no status handler is installed.
    pub fn disabled() -> Self {
        Self::new(false, "", Vec::new())
    }
}
