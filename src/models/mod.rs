//! Domain models of the bot platform
//!
//! This module defines the payloads exchanged with the platform: outbound
//! API requests and replies, and the webhook callbacks it sends to the bot.

pub mod callback;
pub mod command;
pub mod credentials;
pub mod notification;
pub mod requests;
pub mod responses;
pub mod status;
pub mod user;

// Re-export commonly used types
pub use callback::{NotificationCallback, STATUS_OK};
pub use command::{CommandData, CommandFrom, CommandRequest, CommandResponse, CommandType};
pub use credentials::Credentials;
pub use notification::{
    Button, ButtonAlign, DirectNotification, FileAttachment, Mention, MentionTarget,
    NotificationBody,
};
pub use requests::{CreateChatRequest, FindUsersByEmailsRequest};
pub use responses::{ApiEnvelope, ChatCreatedResult, SyncIdResult};
pub use status::{BotCommand, StatusRequest, StatusResponse};
pub use user::{ChatType, User};
