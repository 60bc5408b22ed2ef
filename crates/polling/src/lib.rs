//! Long-polling update pipeline.
//!
//! A [`Poller`] fetches batches of updates from an [`UpdateSource`] with a
//! monotonically advancing offset and pushes them into an [`UpdateQueue`].
//! A [`Dispatcher`] drains the queue and runs one handler invocation per
//! update. [`start_polling`] performs the start-up handshake and runs both
//! loops until the returned [`PollingHandle`] is cancelled.

pub mod backoff;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod poller;
pub mod queue;
pub mod service;
pub mod source;
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod testing;

pub use {
    backoff::Backoff,
    config::{MAX_BATCH_LIMIT, PollingConfig},
    dispatcher::Dispatcher,
    error::{Error, Result},
    handler::{HandlerFactory, UpdateHandler},
    poller::Poller,
    queue::UpdateQueue,
    service::{PollingHandle, start_polling},
    source::{Update, UpdateSource},
};
