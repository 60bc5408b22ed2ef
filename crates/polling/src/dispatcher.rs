use std::sync::Arc;

use {
    tokio::{
        sync::{OwnedSemaphorePermit, Semaphore},
        task::JoinError,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info},
};

#[cfg(feature = "metrics")]
use updraft_metrics::{counter, dispatch as dispatch_metrics, gauge, histogram, labels};

use crate::{Error, HandlerFactory, Update, UpdateQueue};

/// Consumer loop: drains the queue and runs one handler task per update.
///
/// Handler invocations run independently, so a slow handler never delays
/// later updates. With a concurrency cap the dispatcher waits for a free
/// slot *before* taking the next update off the queue.
pub struct Dispatcher<U: Update> {
    queue: Arc<UpdateQueue<U>>,
    factory: Arc<dyn HandlerFactory<U>>,
    permits: Option<Arc<Semaphore>>,
}

impl<U: Update> Dispatcher<U> {
    pub fn new(
        queue: Arc<UpdateQueue<U>>,
        factory: Arc<dyn HandlerFactory<U>>,
        max_in_flight: Option<usize>,
    ) -> Self {
        Self {
            queue,
            factory,
            permits: max_in_flight.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Dispatch until `cancel` fires.
    ///
    /// Returns without waiting for in-flight handler tasks.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            max_in_flight = self.permits.as_ref().map(|s| s.available_permits()),
            "update dispatcher started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let permit = match &self.permits {
                Some(permits) => tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    permit = Arc::clone(permits).acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        // The semaphore is never closed while we hold it.
                        Err(_) => break,
                    },
                },
                None => None,
            };

            let update = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                update = self.queue.dequeue() => update,
            };

            self.spawn_handler(update, permit);
        }

        info!(pending = self.queue.len(), "update dispatcher stopped");
    }

    fn spawn_handler(&self, update: U, permit: Option<OwnedSemaphorePermit>) {
        let factory = Arc::clone(&self.factory);

        #[cfg(feature = "metrics")]
        {
            counter!(dispatch_metrics::DISPATCHED_TOTAL).increment(1);
            gauge!(dispatch_metrics::IN_FLIGHT).increment(1.0);
        }

        tokio::spawn(async move {
            let _permit = permit;
            let update_id = update.update_id();
            #[cfg(feature = "metrics")]
            let started = std::time::Instant::now();

            // Run the handler in its own task so a panic surfaces here as a
            // `JoinError` instead of unwinding past the bookkeeping below.
            let outcome = tokio::spawn(async move {
                let handler = factory.create();
                handler.process(update).await
            })
            .await;

            #[cfg(feature = "metrics")]
            {
                histogram!(dispatch_metrics::HANDLER_DURATION_SECONDS)
                    .record(started.elapsed().as_secs_f64());
                gauge!(dispatch_metrics::IN_FLIGHT).decrement(1.0);
            }

            match outcome {
                Ok(Ok(())) => debug!(update_id, "update handled"),
                Ok(Err(e)) => {
                    #[cfg(feature = "metrics")]
                    counter!(dispatch_metrics::HANDLER_ERRORS_TOTAL, labels::OUTCOME => "error")
                        .increment(1);

                    let err = Error::Handler(e);
                    error!(update_id, error = %err, "update handler failed");
                },
                Err(e) => {
                    #[cfg(feature = "metrics")]
                    counter!(dispatch_metrics::HANDLER_ERRORS_TOTAL, labels::OUTCOME => "panic")
                        .increment(1);

                    error!(update_id, panic = %panic_message(e), "update handler panicked");
                },
            }
        });
    }
}

/// Best-effort text of a handler task's panic payload.
fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
