use {
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{UpdateKind, User},
    },
    tracing::debug,
    updraft_polling::UpdateHandler,
};

use crate::TelegramUpdate;

/// Replies to every text message with a greeting that repeats the text.
///
/// Other update kinds are ignored.
pub struct EchoHandler {
    bot: Bot,
}

impl EchoHandler {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// A factory building one handler per update, all sharing `bot`.
    pub fn factory(bot: Bot) -> impl Fn() -> Self + Send + Sync + 'static {
        move || Self::new(bot.clone())
    }
}

#[async_trait]
impl UpdateHandler<TelegramUpdate> for EchoHandler {
    async fn process(&self, update: TelegramUpdate) -> anyhow::Result<()> {
        let update_id = update.id.0;
        let UpdateKind::Message(msg) = update.into_inner().kind else {
            debug!(update_id, "ignoring non-message update");
            return Ok(());
        };
        let Some(text) = msg.text() else {
            debug!(update_id, chat_id = msg.chat.id.0, "ignoring message without text");
            return Ok(());
        };

        let reply = greeting(msg.from.as_ref(), text);
        self.bot.send_message(msg.chat.id, reply).await?;
        debug!(update_id, chat_id = msg.chat.id.0, "echo reply sent");
        Ok(())
    }
}

/// `Hello,{first}{last}.You said {text}`
pub fn greeting(from: Option<&User>, text: &str) -> String {
    let name = from
        .map(|u| format!("{}{}", u.first_name, u.last_name.as_deref().unwrap_or("")))
        .unwrap_or_default();
    format!("Hello,{name}.You said {text}")
}
