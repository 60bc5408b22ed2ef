//! Telegram Bot API adapter for the updraft polling pipeline.
//!
//! [`TelegramSource`] implements `UpdateSource` on top of teloxide's
//! `getUpdates`/`deleteWebhook`; [`EchoHandler`] is a minimal handler that
//! greets the sender and repeats their text.

pub mod config;
pub mod echo;
pub mod error;
pub mod source;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod mock_api;

pub use {
    config::TelegramAccountConfig,
    echo::EchoHandler,
    error::{Error, Result},
    source::{TelegramSource, TelegramUpdate},
};
