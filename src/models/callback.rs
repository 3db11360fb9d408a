//! Notification callback payload
//!
//! Body of `POST /notification/callback`, sent by the platform once a
//! notification accepted earlier has been processed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::callbacks::CallbackResult;

/// Status value reported for a successful operation.
pub const STATUS_OK: &str = "ok";

/// Result of an asynchronously processed notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationCallback {
    /// Sync id returned when the notification was accepted
    pub sync_id: Uuid,
    /// "ok" on success, anything else on failure
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<Value>,
}

impl NotificationCallback {
    /// Builds a successful callback for `sync_id`.
    pub fn ok(sync_id: Uuid) -> Self {
        Self {
            sync_id,
            status: STATUS_OK.to_string(),
            result: None,
            reason: None,
            errors: Vec::new(),
            error_data: None,
        }
    }

    /// Builds a failed callback for `sync_id`.
    pub fn error(sync_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            reason: Some(reason.into()),
            ..Self::ok(sync_id)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

impl CallbackResult for NotificationCallback {
    fn sync_id(&self) -> Uuid {
        self.sync_id
    }

    fn failure_reason(&self) -> Option<String> {
        if self.is_ok() {
            None
        } else {
            Some(
                self.reason
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            )
        }
    }
}
