use std::sync::Arc;

use {
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use crate::{
    Dispatcher, HandlerFactory, Poller, PollingConfig, Result, UpdateQueue, UpdateSource,
};

/// Start the polling pipeline for `source`.
///
/// Validates `config` and disables webhook delivery on the remote API
/// before anything is spawned; either failure is returned and nothing keeps
/// running. On success the poller and dispatcher run as two background
/// tasks until the returned handle is cancelled.
pub async fn start_polling<S: UpdateSource>(
    source: Arc<S>,
    factory: Arc<dyn HandlerFactory<S::Update>>,
    config: &PollingConfig,
) -> Result<PollingHandle<S::Update>> {
    config.validate()?;

    source.disable_webhook().await?;
    info!("webhook cleared, switching to long polling");

    let cancel = CancellationToken::new();
    let queue = Arc::new(UpdateQueue::new());

    let poller = Poller::new(source, Arc::clone(&queue), config);
    let dispatcher = Dispatcher::new(Arc::clone(&queue), factory, config.in_flight_limit());

    let poller = tokio::spawn(poller.run(cancel.clone()));
    let dispatcher = tokio::spawn(dispatcher.run(cancel.clone()));

    Ok(PollingHandle {
        cancel,
        queue,
        poller,
        dispatcher,
    })
}

/// Owner of a running pipeline.
///
/// Dropping the handle does not stop the loops; call [`cancel`](Self::cancel)
/// or [`stop`](Self::stop).
pub struct PollingHandle<U> {
    cancel: CancellationToken,
    queue: Arc<UpdateQueue<U>>,
    poller: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl<U> PollingHandle<U> {
    /// Ask both loops to stop at their next iteration boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the shutdown token, e.g. to tie other tasks to it.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The hand-off queue, for inspecting how many updates are pending.
    pub fn queue(&self) -> &Arc<UpdateQueue<U>> {
        &self.queue
    }

    /// Cancel and wait for both loops to exit.
    ///
    /// Handler invocations that are already running are not awaited.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.poller.await {
            warn!(error = %e, "update poller task failed");
        }
        if let Err(e) = self.dispatcher.await {
            warn!(error = %e, "update dispatcher task failed");
        }
        info!(pending = self.queue.len(), "polling stopped");
    }
}
