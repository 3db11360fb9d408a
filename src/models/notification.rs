//! Direct notification builder
//!
//! Body of `POST /api/v4/botx/notifications/direct`, with buttons, mentions
//! and delivery options.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{BotError, Result};

// == Direct Notification ==
/// A message sent by the bot into a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectNotification {
    pub group_chat_id: Uuid,
    /// Restricts delivery to these users, empty = whole chat
    pub recipients: Vec<Uuid>,
    pub notification: NotificationBody,
    pub file: Option<FileAttachment>,
    /// Message visible only until read
    pub stealth_mode: bool,
    /// Whether a push notification is sent
    pub send_push: bool,
    /// Deliver even when recipients are in do-not-disturb
    pub force_dnd: bool,
}

/// Text, metadata and buttons of a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "NotificationOpts::is_default")]
    pub opts: NotificationOpts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keyboard: Vec<Vec<Button>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bubble: Vec<Vec<Button>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<Mention>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationOpts {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub silent_response: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub buttons_auto_adjust: bool,
}

impl NotificationOpts {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// File sent along with a notification, `data` being a data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAttachment {
    pub file_name: String,
    pub data: String,
}

impl DirectNotification {
    /// A notification with `body` for `group_chat_id`, push enabled.
    pub fn new(group_chat_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            group_chat_id,
            recipients: Vec::new(),
            notification: NotificationBody {
                body: body.into(),
                ..NotificationBody::default()
            },
            file: None,
            stealth_mode: false,
            send_push: true,
            force_dnd: false,
        }
    }

    pub fn recipients(mut self, recipients: Vec<Uuid>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Attaches arbitrary JSON metadata, echoed back in button commands.
    pub fn metadata<T: Serialize>(mut self, metadata: &T) -> Result<Self> {
        self.notification.metadata = Some(serde_json::to_value(metadata)?);
        Ok(self)
    }

    pub fn bubble_row(mut self, buttons: Vec<Button>) -> Self {
        self.notification.bubble.push(buttons);
        self
    }

    pub fn keyboard_row(mut self, buttons: Vec<Button>) -> Self {
        self.notification.keyboard.push(buttons);
        self
    }

    pub fn mention(mut self, mention: Mention) -> Self {
        self.notification.mentions.push(mention);
        self
    }

    pub fn file(mut self, file_name: impl Into<String>, data: impl Into<String>) -> Self {
        self.file = Some(FileAttachment {
            file_name: file_name.into(),
            data: data.into(),
        });
        self
    }

    pub fn stealth(mut self) -> Self {
        self.stealth_mode = true;
        self
    }

    pub fn without_push(mut self) -> Self {
        self.send_push = false;
        self
    }

    pub fn force_dnd(mut self) -> Self {
        self.force_dnd = true;
        self
    }

    /// Rejects notifications with neither text nor file.
    pub fn validate(&self) -> Result<()> {
        if self.notification.body.trim().is_empty() && self.file.is_none() {
            return Err(BotError::InvalidRequest(
                "notification needs a body or a file".to_string(),
            ));
        }
        Ok(())
    }
}

impl Serialize for DirectNotification {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            group_chat_id: Uuid,
            #[serde(skip_serializing_if = "<[Uuid]>::is_empty")]
            recipients: &'a [Uuid],
            notification: &'a NotificationBody,
            #[serde(skip_serializing_if = "Option::is_none")]
            file: Option<&'a FileAttachment>,
            #[serde(skip_serializing_if = "Map::is_empty")]
            opts: Map<String, Value>,
        }

        let mut notification_opts = Map::new();
        if !self.send_push {
            notification_opts.insert("send".into(), Value::Bool(false));
        }
        if self.force_dnd {
            notification_opts.insert("force_dnd".into(), Value::Bool(true));
        }

        let mut opts = Map::new();
        if self.stealth_mode {
            opts.insert("stealth_mode".into(), Value::Bool(true));
        }
        if !notification_opts.is_empty() {
            opts.insert("notification_opts".into(), Value::Object(notification_opts));
        }

        Wire {
            group_chat_id: self.group_chat_id,
            recipients: &self.recipients,
            notification: &self.notification,
            file: self.file.as_ref(),
            opts,
        }
        .serialize(serializer)
    }
}

// == Buttons ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonAlign {
    Left,
    Center,
    Right,
}

/// A bubble or keyboard button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "ButtonOpts::is_default")]
    pub opts: ButtonOpts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ButtonOpts {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub silent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_size: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_alert: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<ButtonAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
}

impl ButtonOpts {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Button {
    /// A button that sends `command` back to the bot when pressed.
    pub fn command(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            label: label.into(),
            data: None,
            opts: ButtonOpts::default(),
        }
    }

    /// A button that opens `url` on the client.
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            command: None,
            label: label.into(),
            data: None,
            opts: ButtonOpts {
                link: Some(url.into()),
                handler: Some("client".to_string()),
                ..ButtonOpts::default()
            },
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn silent(mut self) -> Self {
        self.opts.silent = true;
        self
    }

    pub fn font_color(mut self, color: impl Into<String>) -> Self {
        self.opts.font_color = Some(color.into());
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.opts.background_color = Some(color.into());
        self
    }

    pub fn align(mut self, align: ButtonAlign) -> Self {
        self.opts.align = Some(align);
        self
    }

    pub fn horizontal_size(mut self, h_size: u32) -> Self {
        self.opts.h_size = Some(h_size);
        self
    }

    pub fn alert(mut self, text: impl Into<String>) -> Self {
        self.opts.show_alert = true;
        self.opts.alert_text = Some(text.into());
        self
    }

    pub fn no_alert(mut self) -> Self {
        self.opts.show_alert = false;
        self.opts.alert_text = None;
        self
    }
}

// == Mentions ==
/// What a mention points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionTarget {
    /// Everyone in the chat
    All,
    Chat { group_chat_id: Uuid, name: String },
    Channel { group_chat_id: Uuid, name: String },
    User { user_huid: Uuid, name: String },
    Contact { user_huid: Uuid, name: String },
}

/// A mention embedded in the body as `@{mention:<mention_id>}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub mention_id: Uuid,
    pub target: MentionTarget,
}

impl Mention {
    /// Creates a mention with a fresh id.
    pub fn new(target: MentionTarget) -> Self {
        Self {
            mention_id: Uuid::new_v4(),
            target,
        }
    }

    /// Placeholder to put in the notification body.
    pub fn placeholder(&self) -> String {
        format!("@{{mention:{}}}", self.mention_id)
    }
}

impl Serialize for Mention {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct MentionData<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            group_chat_id: Option<Uuid>,
            #[serde(skip_serializing_if = "Option::is_none")]
            user_huid: Option<Uuid>,
            name: &'a str,
        }

        #[derive(Serialize)]
        struct Wire<'a> {
            mention_type: &'static str,
            mention_id: Uuid,
            #[serde(skip_serializing_if = "Option::is_none")]
            mention_data: Option<MentionData<'a>>,
        }

        let (mention_type, mention_data) = match &self.target {
            MentionTarget::All => ("all", None),
            MentionTarget::Chat {
                group_chat_id,
                name,
            } => (
                "chat",
                Some(MentionData {
                    group_chat_id: Some(*group_chat_id),
                    user_huid: None,
                    name,
                }),
            ),
            MentionTarget::Channel {
                group_chat_id,
                name,
            } => (
                "channel",
                Some(MentionData {
                    group_chat_id: Some(*group_chat_id),
                    user_huid: None,
                    name,
                }),
            ),
            MentionTarget::User { user_huid, name } => (
                "user",
                Some(MentionData {
                    group_chat_id: None,
                    user_huid: Some(*user_huid),
                    name,
                }),
            ),
            MentionTarget::Contact { user_huid, name } => (
                "contact",
                Some(MentionData {
                    group_chat_id: None,
                    user_huid: Some(*user_huid),
                    name,
                }),
            ),
        };

        Wire {
            mention_type,
            mention_id: self.mention_id,
            mention_data,
        }
        .serialize(serializer)
    }
}
