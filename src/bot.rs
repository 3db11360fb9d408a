//! Bot Facade
//!
//! Ties the API client, lookup caches and callback correlator together
//! behind one handle shared by user code and the webhook router.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use axum::Router;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::create_router;
use crate::cache::KvCache;
use crate::callbacks::Correlator;
use crate::client::ApiClient;
use crate::config::BotOptions;
use crate::error::{BotError, Result};
use crate::models::{
    CommandRequest, CreateChatRequest, Credentials, DirectNotification, NotificationCallback,
    StatusRequest, StatusResponse, User,
};

/// Answers `GET /status`, None falls back to a disabled menu.
pub type StatusHandler =
    Arc<dyn Fn(&Bot, &StatusRequest) -> Option<StatusResponse> + Send + Sync>;

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Runs an accepted `POST /command` in the background.
pub type CommandHandler = Arc<dyn Fn(Arc<Bot>, CommandRequest) -> CommandFuture + Send + Sync>;

// == Bot ==
/// A bot account with its caches and webhook state.
pub struct Bot {
    credentials: Credentials,
    client: ApiClient,
    /// lower-cased email -> user id
    email_cache: KvCache<String, Uuid>,
    /// user id -> personal chat id, never expires
    chat_cache: KvCache<Uuid, Uuid>,
    callbacks: Correlator<NotificationCallback>,
    callbacks_enabled: AtomicBool,
    jwt_leeway: Duration,
    status_handler: RwLock<Option<StatusHandler>>,
    command_handler: RwLock<Option<CommandHandler>>,
}

impl Bot {
    // == Constructor ==
    /// Creates a bot. Fails with [`BotError::NoRuntime`] outside a Tokio
    /// runtime, since the callback sweep is spawned here.
    pub fn new(credentials: Credentials, options: BotOptions) -> Result<Arc<Self>> {
        tokio::runtime::Handle::try_current().map_err(|_| BotError::NoRuntime)?;
        let client = ApiClient::new(credentials.clone(), &options)?;

        info!(
            "Bot {} created for host {}",
            credentials.bot_id, credentials.host
        );

        Ok(Arc::new(Self {
            credentials,
            client,
            email_cache: KvCache::new(options.email_cache_ttl),
            chat_cache: KvCache::new(Duration::ZERO),
            callbacks: Correlator::new(options.callback_store),
            callbacks_enabled: AtomicBool::new(false),
            jwt_leeway: options.jwt_leeway,
            status_handler: RwLock::new(None),
            command_handler: RwLock::new(None),
        }))
    }

    /// Parses `host@secret_key@bot_id` and creates a bot.
    pub fn from_credentials(credentials: &str, options: BotOptions) -> Result<Arc<Self>> {
        Self::new(Credentials::parse(credentials)?, options)
    }

    pub fn id(&self) -> Uuid {
        self.credentials.bot_id
    }

    pub fn host(&self) -> &str {
        &self.credentials.host
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.credentials.secret_key
    }

    pub(crate) fn jwt_leeway(&self) -> Duration {
        self.jwt_leeway
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // == Handlers ==
    /// Installs the `GET /status` handler.
    pub fn on_status<F>(&self, handler: F)
    where
        F: Fn(&Bot, &StatusRequest) -> Option<StatusResponse> + Send + Sync + 'static,
    {
        *self
            .status_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Installs the `POST /command` handler.
    pub fn on_command<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<Bot>, CommandRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: CommandHandler =
            Arc::new(move |bot: Arc<Bot>, request: CommandRequest| -> CommandFuture {
                Box::pin(handler(bot, request))
            });
        *self
            .command_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    pub(crate) fn status_for(&self, request: &StatusRequest) -> Option<StatusResponse> {
        let handler = self
            .status_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        handler.and_then(|handler| handler(self, request))
    }

    /// Spawns the command handler, false when none is installed.
    pub(crate) fn spawn_command(self: &Arc<Self>, request: CommandRequest) -> bool {
        let handler = self
            .command_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match handler {
            Some(handler) => {
                debug!("Dispatching command {}", request.sync_id);
                tokio::spawn(handler(self.clone(), request));
                true
            }
            None => false,
        }
    }

    pub(crate) fn deliver_callback(&self, callback: NotificationCallback) {
        self.callbacks.deliver(callback);
    }

    // == Users ==
    /// Looks users up by email and caches every email they own.
    pub async fn find_users_by_emails(&self, emails: Vec<String>) -> Result<Vec<User>> {
        let users = self.client.find_users_by_emails(emails).await?;

        for user in &users {
            for email in &user.emails {
                self.email_cache.set(email.to_lowercase(), user.user_huid);
            }
        }

        Ok(users)
    }

    /// Resolves emails to user ids, asking the platform only for cache misses.
    ///
    /// Returned users carry only their id and the matching lower-cased emails.
    pub async fn find_user_ids_by_emails(&self, emails: &[String]) -> Result<Vec<User>> {
        let mut found: HashMap<Uuid, BTreeSet<String>> = HashMap::new();
        let mut missing = BTreeSet::new();

        for email in emails {
            let email = email.to_lowercase();
            match self.email_cache.get(&email) {
                Some(user_id) => {
                    found.entry(user_id).or_default().insert(email);
                }
                None => {
                    missing.insert(email);
                }
            }
        }

        if !missing.is_empty() {
            debug!("{} emails not cached, querying platform", missing.len());
            let users = self
                .find_users_by_emails(missing.into_iter().collect())
                .await?;
            for user in users {
                let entry = found.entry(user.user_huid).or_default();
                entry.extend(user.emails.iter().map(|e| e.to_lowercase()));
            }
        }

        Ok(found
            .into_iter()
            .map(|(user_id, emails)| User::with_emails(user_id, emails.into_iter().collect()))
            .collect())
    }

    // == Chats ==
    /// Returns the personal chat with `user_id`, creating it once.
    pub async fn create_chat_with_user(&self, user_id: Uuid) -> Result<Uuid> {
        if let Some(chat_id) = self.chat_cache.get(&user_id) {
            return Ok(chat_id);
        }

        let chat_id = self
            .client
            .create_chat(&CreateChatRequest::personal(user_id))
            .await?;
        self.chat_cache.set(user_id, chat_id);
        info!("Created personal chat {} with user {}", chat_id, user_id);

        Ok(chat_id)
    }

    // == Messages ==
    /// Sends a notification and returns its sync id without waiting.
    pub async fn send_message_async(&self, notification: &DirectNotification) -> Result<Uuid> {
        self.client.send_notification(notification).await
    }

    /// Sends a notification and waits for the platform's callback.
    ///
    /// Needs the webhook router built with [`Bot::router`], since results
    /// arrive on `POST /notification/callback`.
    pub async fn send_message_sync(
        &self,
        notification: &DirectNotification,
    ) -> Result<NotificationCallback> {
        if !self.callbacks_enabled.load(Ordering::Acquire) {
            return Err(BotError::CallbacksNotConfigured);
        }

        let sync_id = self.send_message_async(notification).await?;
        debug!("Awaiting callback {}", sync_id);
        Ok(self.callbacks.await_result(sync_id).await?)
    }

    // == Webhook ==
    /// Builds the webhook router and enables synchronous sends.
    pub fn router(self: &Arc<Self>) -> Router {
        self.callbacks_enabled.store(true, Ordering::Release);
        create_router(self.clone())
    }

    /// Stops the callback sweep task. Pending awaits still time out normally.
    pub async fn shutdown(&self) {
        self.callbacks.stop().await;
        info!("Bot {} shut down", self.credentials.bot_id);
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("bot_id", &self.credentials.bot_id)
            .field("host", &self.credentials.host)
            .field("callbacks_enabled", &self.callbacks_enabled)
            .finish_non_exhaustive()
    }
}
