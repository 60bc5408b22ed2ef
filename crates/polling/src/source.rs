use {async_trait::async_trait, tokio_util::sync::CancellationToken};

use crate::Result;

/// An inbound update carrying a stream-unique, strictly increasing id.
///
/// Everything else about the payload is opaque to the pipeline.
pub trait Update: Send + 'static {
    fn update_id(&self) -> u64;
}

/// Outbound side of the remote messaging API.
#[async_trait]
pub trait UpdateSource: Send + Sync + 'static {
    type Update: Update;

    /// Fetch up to `limit` pending updates with `id >= offset`, ascending.
    ///
    /// An empty backlog is `Ok(vec![])`. Every failure, including
    /// cancellation while the request is in flight, is a transient error.
    async fn fetch(
        &self,
        offset: u64,
        limit: u8,
        cancel: &CancellationToken,
    ) -> Result<Vec<Self::Update>>;

    /// Switch the remote API to pull delivery by removing any registered
    /// webhook. Called once before the first fetch; must be idempotent.
    async fn disable_webhook(&self) -> Result<()>;
}
