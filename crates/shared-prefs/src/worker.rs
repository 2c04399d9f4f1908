use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::store::{NativeStore, StoreError, WriteBatch};

#[derive(Debug, Error)]
pub(crate) enum FlushError {
    #[error("The flush worker is not running (thread probably panicked)")]
    WorkerGone,

    #[error(transparent)]
    Store(#[from] StoreError),
}

enum FlushRequest {
    Write {
        store: Arc<dyn NativeStore>,
        batch: WriteBatch,
        reply: Option<oneshot::Sender<Result<(), StoreError>>>,
    },
    Barrier(oneshot::Sender<()>),
}

/// A single background thread that writes batches to their stores in submission order.
///
/// Synchronous commits and asynchronous applies go through the same queue, so a commit is
/// never persisted ahead of an apply submitted before it.
///
/// The blocking methods must not be called from inside an async runtime.
#[derive(Clone)]
pub(crate) struct FlushWorker {
    tx: mpsc::UnboundedSender<FlushRequest>,
}

impl FlushWorker {
    pub(crate) fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<FlushRequest>();

        let spawned = std::thread::Builder::new()
            .name("shared-prefs-flush".to_owned())
            .spawn(move || {
                while let Some(request) = rx.blocking_recv() {
                    match request {
                        FlushRequest::Write {
                            store,
                            batch,
                            reply,
                        } => {
                            let result = store.write(&batch);
                            match reply {
                                Some(reply) => {
                                    // The caller may have given up waiting
                                    let _ = reply.send(result);
                                }
                                None => {
                                    if let Err(e) = result {
                                        log::warn!(
                                            "Background write to {:?} failed: {e}",
                                            store.name()
                                        );
                                    }
                                }
                            }
                        }
                        FlushRequest::Barrier(done) => {
                            let _ = done.send(());
                        }
                    }
                }
                log::debug!("Flush worker stopped");
            });

        if let Err(e) = spawned {
            // Requests fail with `WorkerGone` once the receiver above is dropped
            log::error!("Failed to start the flush worker: {e}");
        }

        FlushWorker { tx }
    }

    /// Write the batch and block until the store reports the outcome.
    pub(crate) fn write_blocking(
        &self,
        store: Arc<dyn NativeStore>,
        batch: WriteBatch,
    ) -> Result<(), FlushError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(FlushRequest::Write {
                store,
                batch,
                reply: Some(reply_tx),
            })
            .map_err(|_| FlushError::WorkerGone)?;

        reply_rx.blocking_recv().map_err(|_| FlushError::WorkerGone)??;
        Ok(())
    }

    /// Queue the batch and return immediately.
    pub(crate) fn write_detached(&self, store: Arc<dyn NativeStore>, batch: WriteBatch) {
        let name = store.name().to_owned();
        let request = FlushRequest::Write {
            store,
            batch,
            reply: None,
        };

        if self.tx.send(request).is_err() {
            log::warn!("Dropping background write to {name:?}, flush worker is not running");
        }
    }

    /// Block until every request queued before this call has been processed.
    pub(crate) fn sync(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(FlushRequest::Barrier(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.blocking_recv();
    }
}
