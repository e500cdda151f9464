//! Write-behind persistence for the account table
//!
//! The single-writer pattern using a Tokio actor: every mutating bank
//! operation marks the ledger dirty, and the actor writes one whole
//! `accounts` snapshot after a quiet window, coalescing bursts (e.g. a
//! run of message rewards) into a single store write. Operations that
//! must hit disk right away go through `flush_now` instead.
//!
//! A failed snapshot write keeps the ledger dirty and re-arms the
//! timer, so coins are not silently dropped on a transient I/O error.

use crate::{
    bank::Bank,
    error::{Error, Result},
    metrics::Metrics,
    storage::Store,
    types::Account,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};

/// Name of the snapshot collection the actor owns
const ACCOUNTS_COLLECTION: &str = "accounts";

/// Message sent to the flush actor
pub enum FlushMessage {
    /// The ledger changed; write after the quiet window
    MarkDirty,

    /// Write immediately
    FlushNow {
        /// Completion signal
        response: oneshot::Sender<Result<()>>,
    },

    /// Final flush, then stop
    Shutdown {
        /// Completion signal
        response: oneshot::Sender<Result<()>>,
    },
}

/// Actor that owns the snapshot write path
pub struct FlushActor {
    store: Arc<Store>,
    bank: Arc<Mutex<Bank>>,
    mailbox: mpsc::UnboundedReceiver<FlushMessage>,
    debounce: Duration,
    dirty: bool,
    metrics: Metrics,
}

impl FlushActor {
    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                msg = self.mailbox.recv() => match msg {
                    Some(FlushMessage::MarkDirty) => {
                        self.dirty = true;
                        deadline = Instant::now() + self.debounce;
                    }

                    Some(FlushMessage::FlushNow { response }) => {
                        let result = self.write_snapshot().await;
                        let _ = response.send(result);
                    }

                    Some(FlushMessage::Shutdown { response }) => {
                        let result = if self.dirty {
                            self.write_snapshot().await
                        } else {
                            Ok(())
                        };
                        let _ = response.send(result);
                        break;
                    }

                    // All handles dropped: flush what's left and stop.
                    None => {
                        if self.dirty {
                            if let Err(e) = self.write_snapshot().await {
                                tracing::error!(error = %e, "Final snapshot write failed");
                            }
                        }
                        break;
                    }
                },

                _ = tokio::time::sleep_until(deadline), if self.dirty => {
                    if let Err(e) = self.write_snapshot().await {
                        // Keep dirty and try again after another window.
                        tracing::error!(error = %e, "Debounced snapshot write failed, retrying");
                        deadline = Instant::now() + self.debounce;
                    }
                }
            }
        }
    }

    async fn write_snapshot(&mut self) -> Result<()> {
        // Snapshot under the lock, write outside it. The store write
        // retries with a blocking backoff, so it runs off the runtime.
        let accounts: Vec<Account> = self.bank.lock().accounts().to_vec();
        let count = accounts.len();
        let store = self.store.clone();

        let started = std::time::Instant::now();
        tokio::task::spawn_blocking(move || store.write(ACCOUNTS_COLLECTION, &accounts))
            .await
            .map_err(|e| Error::Concurrency(format!("snapshot writer panicked: {}", e)))??;
        self.dirty = false;
        self.metrics.record_flush(started.elapsed().as_secs_f64());

        tracing::debug!(accounts = count, "Account snapshot written");
        Ok(())
    }
}

/// Handle for talking to the flush actor
#[derive(Clone)]
pub struct FlushHandle {
    sender: mpsc::UnboundedSender<FlushMessage>,
}

impl FlushHandle {
    /// Mark the ledger dirty (debounced write)
    pub fn mark_dirty(&self) {
        if self.sender.send(FlushMessage::MarkDirty).is_err() {
            tracing::warn!("Flush actor gone, snapshot not scheduled");
        }
    }

    /// Write the snapshot immediately
    pub async fn flush_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(FlushMessage::FlushNow { response: tx })
            .map_err(|_| Error::Concurrency("Flush actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Final flush, then stop the actor
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(FlushMessage::Shutdown { response: tx })
            .map_err(|_| Error::Concurrency("Flush actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }
}

/// Spawn the flush actor
pub fn spawn_flush_actor(
    store: Arc<Store>,
    bank: Arc<Mutex<Bank>>,
    debounce: Duration,
    metrics: Metrics,
) -> FlushHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let actor = FlushActor {
        store,
        bank,
        mailbox: rx,
        debounce,
        dirty: false,
        metrics,
    };

    tokio::spawn(async move {
        actor.run().await;
    });

    FlushHandle { sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EconomyConfig};
    use crate::types::UserId;

    fn test_parts() -> (Arc<Store>, Arc<Mutex<Bank>>, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let store = Arc::new(Store::open(&config).unwrap());
        let bank = Arc::new(Mutex::new(Bank::new(EconomyConfig::default())));
        (store, bank, temp_dir)
    }

    #[tokio::test]
    async fn test_flush_now_writes_snapshot() {
        let (store, bank, _temp) = test_parts();
        let metrics = Metrics::new().unwrap();
        let handle = spawn_flush_actor(
            store.clone(),
            bank.clone(),
            Duration::from_secs(60),
            metrics.clone(),
        );

        bank.lock().register(&UserId::new("alice")).unwrap();
        handle.mark_dirty();
        handle.flush_now().await.unwrap();

        let loaded: Vec<Account> = store.read("accounts").unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].balance, 100);

        // Every snapshot write shows up in the flush counters.
        assert_eq!(metrics.flushes_total.get(), 1);
        assert_eq!(metrics.flush_duration.get_sample_count(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_debounce_coalesces_bursts() {
        let (store, bank, _temp) = test_parts();
        let metrics = Metrics::new().unwrap();
        let handle = spawn_flush_actor(
            store.clone(),
            bank.clone(),
            Duration::from_millis(50),
            metrics.clone(),
        );

        for name in ["a", "b", "c"] {
            bank.lock().register(&UserId::new(name)).unwrap();
            handle.mark_dirty();
        }

        // Nothing written during the quiet window.
        assert!(store.read::<Vec<Account>>("accounts").unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(150)).await;

        let loaded: Vec<Account> = store.read("accounts").unwrap().unwrap();
        assert_eq!(loaded.len(), 3);

        // Three dirty marks coalesced into one write.
        assert_eq!(metrics.flushes_total.get(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending() {
        let (store, bank, _temp) = test_parts();
        let handle = spawn_flush_actor(
            store.clone(),
            bank.clone(),
            Duration::from_secs(3600),
            Metrics::new().unwrap(),
        );

        bank.lock().register(&UserId::new("alice")).unwrap();
        handle.mark_dirty();
        handle.shutdown().await.unwrap();

        let loaded: Vec<Account> = store.read("accounts").unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
