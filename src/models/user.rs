//! Platform user and chat types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of chat a bot talks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    Chat,
    GroupChat,
    Channel,
}

/// A user record as returned by the user lookup API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_huid: Uuid,
    #[serde(default)]
    pub ad_login: Option<String>,
    #[serde(default)]
    pub ad_domain: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub company_position: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub other_id: Option<String>,
    #[serde(default)]
    pub user_kind: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cts_id: Option<Uuid>,
    #[serde(default)]
    pub rts_id: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip_phone: Option<String>,
    #[serde(default)]
    pub manager: Option<String>,
    #[serde(default)]
    pub office: Option<String>,
    #[serde(default)]
    pub public_name: Option<String>,
}

impl User {
    /// A bare user carrying only an id and emails.
    pub fn with_emails(user_huid: Uuid, emails: Vec<String>) -> Self {
        Self {
            user_huid,
            ad_login: None,
            ad_domain: None,
            name: None,
            company: None,
            company_position: None,
            department: None,
            emails,
            other_id: None,
            user_kind: None,
            active: false,
            created_at: None,
            updated_at: None,
            cts_id: None,
            rts_id: None,
            description: None,
            ip_phone: None,
            manager: None,
            office: None,
            public_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserialize_partial() {
        let json = r#"{
            "user_huid": "6fafda2c-6505-57a5-a088-25ea5d1d0364",
            "name": "Ivanov Ivan",
            "emails": ["Ivan@Example.com"],
            "active": true,
            "created_at": "2023-03-26T14:36:08.740618Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.name.as_deref(), Some("Ivanov Ivan"));
        assert_eq!(user.emails, vec!["Ivan@Example.com".to_string()]);
        assert!(user.active);
        assert!(user.created_at.is_some());
        assert!(user.ad_login.is_none());
    }

    #[test]
    fn test_chat_type_serialize() {
        assert_eq!(
            serde_json::to_string(&ChatType::GroupChat).unwrap(),
            r#""group_chat""#
        );
    }
}
