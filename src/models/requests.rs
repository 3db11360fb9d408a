//! Request bodies for the platform API
//!
//! Defines the JSON bodies the client posts to the platform.

use serde::Serialize;
use uuid::Uuid;

use super::user::ChatType;

/// Body of `POST /api/v3/botx/users/by_email`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindUsersByEmailsRequest {
    pub emails: Vec<String>,
}

impl FindUsersByEmailsRequest {
    pub fn new(emails: Vec<String>) -> Self {
        Self { emails }
    }
}

/// Body of `POST /api/v3/botx/chats/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateChatRequest {
    pub name: String,
    pub chat_type: ChatType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Uuid>,
}

impl CreateChatRequest {
    /// A one-to-one chat between the bot and `user_huid`.
    pub fn personal(user_huid: Uuid) -> Self {
        Self {
            name: "Personal chat".to_string(),
            chat_type: ChatType::Chat,
            members: vec![user_huid],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personal_chat_request() {
        let user = Uuid::new_v4();
        let json = serde_json::to_value(CreateChatRequest::personal(user)).unwrap();

        assert_eq!(json["chat_type"], "chat");
        assert_eq!(json["name"], "Personal chat");
        assert_eq!(json["members"][0], user.to_string());
    }

    #[test]
    fn test_find_users_request() {
        let req = FindUsersByEmailsRequest::new(vec!["a@x.com".into()]);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"emails":["a@x.com"]}"#);
    }
}
