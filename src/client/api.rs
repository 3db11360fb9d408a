//! Platform API Client
//!
//! Signed HTTP calls to the platform: token acquisition, user lookup, chat
//! creation and direct notifications.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::BotOptions;
use crate::error::{BotError, Result};
use crate::models::{
    ApiEnvelope, ChatCreatedResult, CreateChatRequest, Credentials, DirectNotification,
    FindUsersByEmailsRequest, SyncIdResult, User,
};

/// Longest error body quoted back in [`BotError::Api`].
const MAX_ERROR_BODY: usize = 512;

// == API Client ==
/// HTTP client bound to one bot account.
///
/// The bearer token is fetched lazily on the first authorized call and
/// cached until the platform rejects it.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    signature: String,
    token: RwLock<Option<String>>,
    recover_unauthorized: bool,
}

impl ApiClient {
    // == Constructor ==
    pub fn new(credentials: Credentials, options: &BotOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.http_timeout)
            .build()?;
        let signature = credentials.token_signature()?;

        Ok(Self {
            http,
            base_url: format!("{}://{}", options.api_scheme, credentials.host),
            signature,
            credentials,
            token: RwLock::new(None),
            recover_unauthorized: options.recover_unauthorized,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // == Token ==
    /// Requests a new bearer token with the bot's signature.
    pub async fn fetch_token(&self) -> Result<String> {
        let path = format!(
            "/api/v2/botx/bots/{}/token?signature={}",
            self.credentials.bot_id, self.signature
        );
        let response = self.http.get(self.url(&path)).send().await?;
        let token = parse_envelope::<String>(response).await?;
        debug!("Obtained API token for bot {}", self.credentials.bot_id);
        Ok(token)
    }

    /// Returns the cached token, fetching it once if absent.
    async fn token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.fetch_token().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    // == Endpoints ==
    /// Looks users up by email.
    pub async fn find_users_by_emails(&self, emails: Vec<String>) -> Result<Vec<User>> {
        let body = FindUsersByEmailsRequest::new(emails);
        self.call(Method::POST, "/api/v3/botx/users/by_email", Some(&body))
            .await
    }

    /// Creates a chat and returns its id.
    pub async fn create_chat(&self, request: &CreateChatRequest) -> Result<Uuid> {
        let result: ChatCreatedResult = self
            .call(Method::POST, "/api/v3/botx/chats/create", Some(request))
            .await?;
        Ok(result.chat_id)
    }

    /// Sends a notification and returns the sync id its result will carry.
    pub async fn send_notification(&self, notification: &DirectNotification) -> Result<Uuid> {
        notification.validate()?;
        let result: SyncIdResult = self
            .call(
                Method::POST,
                "/api/v4/botx/notifications/direct",
                Some(notification),
            )
            .await?;
        Ok(result.sync_id)
    }

    /// Performs an authorized call and unwraps the reply envelope.
    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut retried = false;
        loop {
            let token = self.token().await?;
            let mut request = self
                .http
                .request(method.clone(), self.url(path))
                .bearer_auth(token);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            if response.status() == StatusCode::UNAUTHORIZED
                && self.recover_unauthorized
                && !retried
            {
                warn!("API rejected token on {}, refreshing", path);
                self.invalidate_token().await;
                retried = true;
                continue;
            }

            return parse_envelope(response).await;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decodes a platform reply into its typed result.
async fn parse_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    match serde_json::from_slice::<ApiEnvelope<T>>(&bytes) {
        Ok(envelope) => envelope.into_result(status.as_u16()),
        Err(_) if !status.is_success() => {
            let text = String::from_utf8_lossy(&bytes);
            Err(BotError::Api {
                status_code: status.as_u16(),
                reason: text.chars().take(MAX_ERROR_BODY).collect(),
            })
        }
        Err(err) => Err(BotError::Decode(err)),
    }
}
