//! Configuration Module
//!
//! Handles loading bot and webhook server configuration from environment
//! variables.

use std::env;
use std::time::Duration;

/// Bot configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credentials in `host@secret_key@bot_id` form
    pub bot_credentials: Option<String>,
    /// Webhook HTTP server port
    pub server_port: u16,
    /// Seconds a callback result is buffered, also the synchronous send timeout
    pub callback_store_secs: u64,
    /// Seconds an email -> user id lookup stays cached
    pub email_cache_ttl_secs: u64,
    /// Clock skew tolerated when validating webhook JWTs, in seconds
    pub jwt_leeway_secs: u64,
    /// Scheme used to reach the platform API ("https" or "http")
    pub api_scheme: String,
    /// Timeout of a single outbound HTTP request, in seconds
    pub http_timeout_secs: u64,
    /// Refresh the API token and retry once when a call is rejected with 401
    pub recover_unauthorized: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `BOT_CREDENTIALS` - `host@secret_key@bot_id` (no default)
    /// - `SERVER_PORT` - Webhook server port (default: 8080)
    /// - `CALLBACK_STORE_SECS` - Callback buffer TTL and await timeout (default: 30)
    /// - `EMAIL_CACHE_TTL_SECS` - Email lookup cache validity (default: 1800)
    /// - `JWT_LEEWAY_SECS` - JWT clock skew leeway (default: 300)
    /// - `API_SCHEME` - Platform API scheme (default: https)
    /// - `HTTP_TIMEOUT_SECS` - Outbound request timeout (default: 30)
    /// - `RECOVER_UNAUTHORIZED` - Retry once on 401 with a fresh token (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bot_credentials: env::var("BOT_CREDENTIALS").ok().filter(|v| !v.is_empty()),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
            callback_store_secs: parse_env::<u64>("CALLBACK_STORE_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.callback_store_secs),
            email_cache_ttl_secs: parse_env("EMAIL_CACHE_TTL_SECS")
                .unwrap_or(defaults.email_cache_ttl_secs),
            jwt_leeway_secs: parse_env("JWT_LEEWAY_SECS").unwrap_or(defaults.jwt_leeway_secs),
            api_scheme: env::var("API_SCHEME")
                .ok()
                .filter(|v| v == "http" || v == "https")
                .unwrap_or(defaults.api_scheme),
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS")
                .unwrap_or(defaults.http_timeout_secs),
            recover_unauthorized: parse_env("RECOVER_UNAUTHORIZED")
                .unwrap_or(defaults.recover_unauthorized),
        }
    }

    pub fn callback_store_duration(&self) -> Duration {
        Duration::from_secs(self.callback_store_secs)
    }

    pub fn email_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.email_cache_ttl_secs)
    }

    pub fn jwt_leeway(&self) -> Duration {
        Duration::from_secs(self.jwt_leeway_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot_credentials: None,
            server_port: 8080,
            callback_store_secs: 30,
            email_cache_ttl_secs: 30 * 60,
            jwt_leeway_secs: 5 * 60,
            api_scheme: "https".to_string(),
            http_timeout_secs: 30,
            recover_unauthorized: false,
        }
    }
}

/// Runtime options of a bot, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct BotOptions {
    /// Buffer TTL for callback results and timeout of synchronous sends
    pub callback_store: Duration,
    /// Validity of email -> user id lookups, zero = never expire
    pub email_cache_ttl: Duration,
    pub jwt_leeway: Duration,
    pub api_scheme: String,
    pub http_timeout: Duration,
    pub recover_unauthorized: bool,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for BotOptions {
    fn from(config: &Config) -> Self {
        Self {
            callback_store: config.callback_store_duration(),
            email_cache_ttl: config.email_cache_ttl(),
            jwt_leeway: config.jwt_leeway(),
            api_scheme: config.api_scheme.clone(),
            http_timeout: config.http_timeout(),
            recover_unauthorized: config.recover_unauthorized,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
