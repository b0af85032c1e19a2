use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;

pub const LONG_POLL_TIMEOUT_SECS: u64 = 60;
const ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Pulls updates with `getUpdates` and hands them to the dispatcher until cancelled.
pub struct Poller {
    dispatcher: Arc<Dispatcher>,
    timeout_secs: u64,
    error_backoff: Duration,
    offset: i64,
}

impl Poller {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Poller {
        Poller {
            dispatcher,
            timeout_secs: LONG_POLL_TIMEOUT_SECS,
            error_backoff: ERROR_BACKOFF,
            offset: 0,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Poller {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Poller {
        self.error_backoff = backoff;
        self
    }

    /// Next `update_id` that will be requested.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Fetches one batch and dispatches it. Returns how many updates were seen.
    pub async fn poll_once(&mut self) -> crate::error::Result<usize> {
        let client = self.dispatcher.context().client.clone();
        let updates = client.get_updates(self.offset, self.timeout_secs).await?;
        for update in &updates {
            self.offset = self.offset.max(update.update_id + 1);
            self.dispatcher.dispatch(update).await;
        }
        Ok(updates.len())
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(timeout_secs = self.timeout_secs, "long polling for updates");
        let backoff = self.error_backoff;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                res = self.poll_once() => {
                    if let Err(e) = res {
                        tracing::error!("error getting updates, retrying in {:?}: {:#}", backoff, e);
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                }
            }
        }
        tracing::info!(offset = self.offset, "stopped polling");
    }
}
