use std::{
    ops::Deref,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, Me, Update},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
    updraft_polling::{self as polling, UpdateSource},
};

use crate::{Error, Result, config::TelegramAccountConfig};

/// Extra time the HTTP client allows on top of the long-poll timeout, so
/// the client never gives up before Telegram answers an idle poll.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// A Telegram update as it travels through the polling pipeline.
#[derive(Debug, Clone)]
pub struct TelegramUpdate(pub Update);

impl TelegramUpdate {
    pub fn into_inner(self) -> Update {
        self.0
    }
}

impl Deref for TelegramUpdate {
    type Target = Update;

    fn deref(&self) -> &Update {
        &self.0
    }
}

impl polling::Update for TelegramUpdate {
    fn update_id(&self) -> u64 {
        u64::from(self.0.id.0)
    }
}

/// `UpdateSource` backed by the Telegram Bot API.
pub struct TelegramSource {
    bot: Bot,
    timeout_secs: u32,
    allowed_updates: Vec<AllowedUpdate>,
    offset_overflow_reported: AtomicBool,
}

impl TelegramSource {
    /// Build a source for `config`, long-polling with `timeout_secs`.
    pub fn new(config: &TelegramAccountConfig, timeout_secs: u32) -> Result<Self> {
        if !config.has_token() {
            return Err(Error::config("telegram bot token is required"));
        }

        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(u64::from(timeout_secs)) + CLIENT_TIMEOUT_MARGIN)
            .build()
            .map_err(Error::http_client)?;
        let mut bot = Bot::with_client(config.token.expose_secret(), client);
        if let Some(api_url) = &config.api_url {
            let url = reqwest::Url::parse(api_url)
                .map_err(|e| Error::config(format!("invalid api_url {api_url:?}: {e}")))?;
            bot = bot.set_api_url(url);
        }

        Ok(Self {
            bot,
            timeout_secs,
            allowed_updates: config.allowed_updates.clone(),
            offset_overflow_reported: AtomicBool::new(false),
        })
    }

    /// The underlying bot, for sending replies.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Verify the token and return the bot's own account.
    pub async fn get_me(&self) -> Result<Me> {
        Ok(self.bot.get_me().await?)
    }
}

#[async_trait]
impl UpdateSource for TelegramSource {
    type Update = TelegramUpdate;

    async fn fetch(
        &self,
        offset: u64,
        limit: u8,
        cancel: &CancellationToken,
    ) -> polling::Result<Vec<TelegramUpdate>> {
        let offset = match i32::try_from(offset) {
            Ok(offset) => offset,
            Err(e) => {
                // Retrying cannot help here; say so once instead of on every attempt.
                if !self.offset_overflow_reported.swap(true, Ordering::Relaxed) {
                    warn!(
                        offset,
                        max = i32::MAX,
                        "offset is beyond the Bot API range, polling cannot make progress"
                    );
                }
                return Err(polling::Error::fetch(
                    format!("offset {offset} out of range"),
                    e,
                ));
            },
        };

        let request = self
            .bot
            .get_updates()
            .offset(offset)
            .limit(limit)
            .timeout(self.timeout_secs)
            .allowed_updates(self.allowed_updates.clone())
            .send();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(polling::Error::Cancelled),
            result = request => result,
        };

        match result {
            Ok(updates) => {
                debug!(offset, count = updates.len(), "got telegram updates");
                Ok(updates.into_iter().map(TelegramUpdate).collect())
            },
            Err(e) => Err(fetch_error(e, offset)),
        }
    }

    async fn disable_webhook(&self) -> polling::Result<()> {
        // Verify credentials first so a bad token fails with a clear error.
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| polling::Error::startup("getMe", e))?;

        self.bot
            .delete_webhook()
            .send()
            .await
            .map_err(|e| polling::Error::startup("deleteWebhook", e))?;

        info!(username = ?me.username, "telegram bot connected (webhook cleared)");
        Ok(())
    }
}

fn fetch_error(error: RequestError, offset: i32) -> polling::Error {
    match error {
        RequestError::RetryAfter(seconds) => polling::Error::RateLimited {
            retry_after: seconds.duration(),
        },
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates) => {
            warn!("another bot instance is polling with this token");
            polling::Error::fetch("getUpdates conflict", error)
        },
        other => polling::Error::fetch(format!("getUpdates(offset={offset})"), other),
    }
}
