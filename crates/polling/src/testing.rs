//! In-memory source and handlers shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use {async_trait::async_trait, tokio::sync::Notify, tokio_util::sync::CancellationToken};

use crate::{Error, Result, Update, UpdateHandler, UpdateSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Msg {
    pub id: u64,
}

impl Update for Msg {
    fn update_id(&self) -> u64 {
        self.id
    }
}

pub fn msgs(ids: &[u64]) -> Vec<Msg> {
    ids.iter().map(|&id| Msg { id }).collect()
}

/// Replays a fixed script of fetch results, then parks until cancelled.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Vec<Msg>>>>,
    offsets: Mutex<Vec<u64>>,
    exhausted: Notify,
    webhook_error: Option<String>,
    webhook_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<Msg>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            offsets: Mutex::new(Vec::new()),
            exhausted: Notify::new(),
            webhook_error: None,
            webhook_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_handshake(message: &str) -> Self {
        Self {
            webhook_error: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn requested_offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn webhook_calls(&self) -> usize {
        self.webhook_calls.load(Ordering::SeqCst)
    }

    /// Resolves once a fetch has found the script empty.
    pub async fn exhausted(&self) {
        self.exhausted.notified().await;
    }
}

#[async_trait]
impl UpdateSource for ScriptedSource {
    type Update = Msg;

    async fn fetch(
        &self,
        offset: u64,
        _limit: u8,
        cancel: &CancellationToken,
    ) -> Result<Vec<Msg>> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                self.exhausted.notify_one();
                cancel.cancelled().await;
                Err(Error::Cancelled)
            },
        }
    }

    async fn disable_webhook(&self) -> Result<()> {
        self.webhook_calls.fetch_add(1, Ordering::SeqCst);
        match &self.webhook_error {
            Some(message) => Err(Error::startup(
                "deleteWebhook",
                std::io::Error::other(message.clone()),
            )),
            None => Ok(()),
        }
    }
}

/// Records every processed id; fails on the ids in `fail_on`.
#[derive(Clone, Default)]
pub struct Recorder {
    pub seen: Arc<Mutex<Vec<u64>>>,
    pub fail_on: Arc<Vec<u64>>,
}

impl Recorder {
    pub fn seen(&self) -> Vec<u64> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateHandler<Msg> for Recorder {
    async fn process(&self, update: Msg) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(update.id);
        if self.fail_on.contains(&update.id) {
            anyhow::bail!("refusing update {}", update.id);
        }
        Ok(())
    }
}
