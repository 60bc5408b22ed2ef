use std::{sync::Arc, time::Duration};

use {
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use updraft_metrics::{counter, gauge, labels, polling as poll_metrics};

use crate::{Backoff, Error, PollingConfig, Result, Update, UpdateQueue, UpdateSource};

/// Producer loop: fetches batches from the source and enqueues them.
///
/// The offset lives here and nowhere else. It only moves forward, and only
/// after a successful fetch: the next request starts one past the highest id
/// seen. It is advanced before the enqueued updates are handled, so updates
/// fetched just before a crash are not redelivered after a restart.
pub struct Poller<S: UpdateSource> {
    source: Arc<S>,
    queue: Arc<UpdateQueue<S::Update>>,
    offset: u64,
    limit: u8,
    backoff: Backoff,
}

impl<S: UpdateSource> Poller<S> {
    pub fn new(source: Arc<S>, queue: Arc<UpdateQueue<S::Update>>, config: &PollingConfig) -> Self {
        Self {
            source,
            queue,
            offset: config.initial_offset,
            limit: config.limit,
            backoff: config.backoff(),
        }
    }

    /// The next update id that will be requested.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Run a single fetch-and-enqueue iteration.
    ///
    /// Returns the number of updates enqueued. On error the offset is left
    /// untouched.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<usize> {
        #[cfg(feature = "metrics")]
        counter!(poll_metrics::FETCHES_TOTAL).increment(1);

        let updates = self.source.fetch(self.offset, self.limit, cancel).await?;
        let count = updates.len();

        let mut max_id: Option<u64> = None;
        for update in updates {
            let id = update.update_id();
            max_id = Some(max_id.map_or(id, |max| max.max(id)));
            self.queue.enqueue(update);
        }

        if let Some(max_id) = max_id {
            self.offset = self.offset.max(max_id.saturating_add(1));
            debug!(count, offset = self.offset, "enqueued updates");

            #[cfg(feature = "metrics")]
            {
                counter!(poll_metrics::UPDATES_RECEIVED_TOTAL).increment(count as u64);
                gauge!(poll_metrics::OFFSET).set(self.offset as f64);
            }
        }

        Ok(count)
    }

    /// Poll until `cancel` fires.
    ///
    /// Transient failures are retried forever with capped exponential
    /// backoff; the wait between attempts is interrupted by cancellation.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(offset = self.offset, limit = self.limit, "update poller started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.poll_once(&cancel).await {
                Ok(_) => self.backoff.reset(),
                Err(Error::Cancelled) if cancel.is_cancelled() => break,
                Err(e) => {
                    let delay = self.retry_delay(&e);

                    #[cfg(feature = "metrics")]
                    {
                        counter!(poll_metrics::FETCH_ERRORS_TOTAL, labels::ERROR_KIND => e.kind())
                            .increment(1);
                        gauge!(poll_metrics::BACKOFF_SECONDS).set(delay.as_secs_f64());
                    }

                    warn!(
                        offset = self.offset,
                        attempt = self.backoff.failures(),
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "fetching updates failed, retrying"
                    );

                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {},
                    }
                },
            }
        }

        info!(offset = self.offset, "update poller stopped");
    }

    fn retry_delay(&mut self, error: &Error) -> Duration {
        let delay = self.backoff.next_delay();
        match error {
            Error::RateLimited { retry_after } => delay.max(*retry_after),
            _ => delay,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::testing::{Msg, ScriptedSource, msgs},
    };

    fn poller(source: ScriptedSource, initial_offset: u64) -> (Poller<ScriptedSource>, Arc<UpdateQueue<Msg>>) {
        let queue = Arc::new(UpdateQueue::new());
        let config = PollingConfig {
            initial_offset,
            limit: 50,
            backoff_initial_ms: 1,
            backoff_max_ms: 4,
            ..Default::default()
        };
        (Poller::new(Arc::new(source), Arc::clone(&queue), &config), queue)
    }

    fn drain(queue: &UpdateQueue<Msg>) -> Vec<u64> {
        std::iter::from_fn(|| queue.try_dequeue())
            .map(|m| m.id)
            .collect()
    }

    #[tokio::test]
    async fn offset_sequence_over_empty_batch() {
        let source = ScriptedSource::new(vec![
            Ok(msgs(&[10, 11])),
            Ok(vec![]),
            Ok(msgs(&[15])),
        ]);
        let (mut poller, queue) = poller(source, 10);
        let cancel = CancellationToken::new();

        assert_eq!(poller.offset(), 10);
        assert_eq!(poller.poll_once(&cancel).await.unwrap(), 2);
        assert_eq!(poller.offset(), 12);
        assert_eq!(poller.poll_once(&cancel).await.unwrap(), 0);
        assert_eq!(poller.offset(), 12);
        assert_eq!(poller.poll_once(&cancel).await.unwrap(), 1);
        assert_eq!(poller.offset(), 16);

        assert_eq!(drain(&queue), vec![10, 11, 15]);
        assert_eq!(poller.source.requested_offsets(), vec![10, 12, 12]);
    }

    #[tokio::test]
    async fn offset_is_max_id_plus_one() {
        let batches = [vec![1, 2, 3], vec![4], vec![9, 20, 21], vec![22, 30]];
        let source = ScriptedSource::new(batches.iter().map(|b| Ok(msgs(b))).collect());
        let (mut poller, queue) = poller(source, 0);
        let cancel = CancellationToken::new();

        for _ in 0..batches.len() {
            poller.poll_once(&cancel).await.unwrap();
        }
        assert_eq!(poller.offset(), 31);
        assert_eq!(drain(&queue).len(), 9);
    }

    #[tokio::test]
    async fn transient_error_keeps_offset() {
        let source = ScriptedSource::new(vec![
            Ok(msgs(&[5])),
            Err(Error::fetch("getUpdates", std::io::Error::other("reset"))),
            Ok(msgs(&[6])),
        ]);
        let (mut poller, queue) = poller(source, 0);
        let cancel = CancellationToken::new();

        poller.poll_once(&cancel).await.unwrap();
        assert_eq!(poller.offset(), 6);

        let err = poller.poll_once(&cancel).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(poller.offset(), 6);

        poller.poll_once(&cancel).await.unwrap();
        assert_eq!(poller.offset(), 7);
        assert_eq!(drain(&queue), vec![5, 6]);
        assert_eq!(poller.source.requested_offsets(), vec![0, 6, 6]);
    }

    #[tokio::test]
    async fn stale_ids_never_move_offset_backwards() {
        let source = ScriptedSource::new(vec![Ok(msgs(&[3]))]);
        let (mut poller, _queue) = poller(source, 40);
        poller.poll_once(&CancellationToken::new()).await.unwrap();
        assert_eq!(poller.offset(), 40);
    }

    #[tokio::test]
    async fn run_retries_through_errors_until_cancelled() {
        let source = ScriptedSource::new(vec![
            Err(Error::fetch("getUpdates", std::io::Error::other("reset"))),
            Err(Error::RateLimited {
                retry_after: Duration::from_millis(5),
            }),
            Ok(msgs(&[1, 2])),
            Err(Error::fetch("getUpdates", std::io::Error::other("timeout"))),
            Ok(msgs(&[3])),
        ]);
        let (poller, queue) = poller(source, 0);
        let source = Arc::clone(&poller.source);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poller.run(cancel.clone()));

        // Script exhaustion parks the source until cancellation.
        tokio::time::timeout(Duration::from_secs(2), source.exhausted())
            .await
            .expect("poller consumed the whole script");
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poller stopped")
            .unwrap();

        assert_eq!(drain(&queue), vec![1, 2, 3]);
        assert_eq!(source.requested_offsets(), vec![0, 0, 0, 3, 3, 4]);
    }

    #[tokio::test]
    async fn run_exits_immediately_when_already_cancelled() {
        let source = ScriptedSource::new(vec![Ok(msgs(&[1]))]);
        let (poller, queue) = poller(source, 0);
        let source = Arc::clone(&poller.source);
        let cancel = CancellationToken::new();
        cancel.cancel();

        poller.run(cancel).await;
        assert!(queue.is_empty());
        assert!(source.requested_offsets().is_empty());
    }
}
