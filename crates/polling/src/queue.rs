use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use tokio::sync::Notify;

#[cfg(feature = "metrics")]
use updraft_metrics::{gauge, queue as queue_metrics};

/// Unbounded FIFO hand-off between the poller and the dispatcher.
///
/// `enqueue` never blocks. `dequeue` suspends until an update is available.
/// The lock is only held for the push/pop itself, never across an `.await`.
pub struct UpdateQueue<U> {
    items: Mutex<VecDeque<U>>,
    notify: Notify,
}

impl<U> Default for UpdateQueue<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> UpdateQueue<U> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Append `update` to the tail and wake one waiting consumer.
    ///
    /// If no consumer is waiting the wake-up is stored, so a consumer that
    /// is about to wait will not miss it.
    pub fn enqueue(&self, update: U) {
        {
            let mut items = self.lock();
            items.push_back(update);
            #[cfg(feature = "metrics")]
            gauge!(queue_metrics::DEPTH).set(items.len() as f64);
        }
        self.notify.notify_one();
    }

    /// Remove and return the head, waiting for one to arrive if empty.
    ///
    /// Cancel safe: dropping the returned future never loses an update.
    pub async fn dequeue(&self) -> U {
        loop {
            if let Some(update) = self.try_dequeue() {
                return update;
            }
            self.notify.notified().await;
        }
    }

    /// Remove and return the head without waiting.
    pub fn try_dequeue(&self) -> Option<U> {
        let mut items = self.lock();
        let update = items.pop_front();
        #[cfg(feature = "metrics")]
        if update.is_some() {
            gauge!(queue_metrics::DEPTH).set(items.len() as f64);
        }
        update
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<U>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
