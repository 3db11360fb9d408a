//! Bot credentials
//!
//! Parses the `host@secret_key@bot_id` credentials string and derives the
//! signature used to request API tokens.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{BotError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Account a bot authenticates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bot id issued by the platform
    pub bot_id: Uuid,
    /// API host, optionally with a port
    pub host: String,
    /// Shared secret for token signatures and webhook JWTs
    pub secret_key: String,
}

impl Credentials {
    /// Parses `host@secret_key@bot_id`.
    pub fn parse(credentials: &str) -> Result<Self> {
        let parts: Vec<&str> = credentials.split('@').collect();
        let [host, secret_key, bot_id] = parts.as_slice() else {
            return Err(BotError::InvalidCredentials(
                "bot credentials must be in 'host@secret_key@bot_id' form".to_string(),
            ));
        };

        if host.is_empty() || secret_key.is_empty() {
            return Err(BotError::InvalidCredentials(
                "host and secret key must not be empty".to_string(),
            ));
        }

        let bot_id = Uuid::parse_str(bot_id).map_err(|e| {
            BotError::InvalidCredentials(format!("bot id '{}' is not a UUID: {}", bot_id, e))
        })?;

        Ok(Self {
            bot_id,
            host: host.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// Upper-case hex HMAC-SHA256 of the bot id, keyed with the secret.
    pub fn token_signature(&self) -> Result<String> {
        // HMAC accepts any key size
        let mut mac = <HmacSha256 as KeyInit>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| BotError::InvalidCredentials(format!("unusable secret key: {}", e)))?;
        mac.update(self.bot_id.to_string().as_bytes());
        Ok(hex::encode_upper(mac.finalize().into_bytes()))
    }
}
