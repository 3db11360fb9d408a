//! Response envelopes of the platform API
//!
//! Every reply is `{"status": "ok"|..., "reason": ..., "result": ...}`.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::STATUS_OK;
use crate::error::{BotError, Result};

/// Generic platform reply wrapping a typed `result`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error_data: Option<Value>,
    pub result: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps the result, turning a non-ok status into [`BotError::Api`].
    pub fn into_result(self, status_code: u16) -> Result<T> {
        if self.status != STATUS_OK {
            let mut reason = self.reason.unwrap_or_else(|| self.status.clone());
            if !self.errors.is_empty() {
                reason = format!("{} ({})", reason, self.errors.join("; "));
            }
            return Err(BotError::Api {
                status_code,
                reason,
            });
        }

        self.result.ok_or_else(|| BotError::Api {
            status_code,
            reason: "response has no result".to_string(),
        })
    }
}

/// Result of an accepted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncIdResult {
    pub sync_id: Uuid,
}

/// Result of chat creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChatCreatedResult {
    pub chat_id: Uuid,
}
