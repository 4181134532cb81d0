//! Background record writer.
//!
//! Rooms never touch the disk themselves. They push a [`StoreOp`] onto an
//! unbounded channel and move on; a single writer task drains the channel
//! in order, encodes each record and hands it to the [`RecordStore`] on
//! the blocking pool. A failed write is logged and forgotten: the next
//! mutation of the same room carries the full record again.

use std::sync::Arc;

use bluffhall_protocol::Codec;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{RecordStore, StoreError};

/// One unit of work for the writer.
#[derive(Debug)]
pub enum StoreOp<R> {
    /// Overwrite the record for `key`.
    Save { key: String, record: R },
    /// Delete the record for `key`.
    Remove { key: String },
    /// Reply once every earlier op has been applied.
    Flush(oneshot::Sender<()>),
}

/// Cloneable sender side of the writer.
#[derive(Debug)]
pub struct StoreHandle<R> {
    tx: mpsc::UnboundedSender<StoreOp<R>>,
}

impl<R> Clone for StoreHandle<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R: Send + 'static> StoreHandle<R> {
    /// Queue a full-record overwrite.
    pub fn save(&self, key: impl Into<String>, record: R) {
        let key = key.into();
        if self.tx.send(StoreOp::Save { key, record }).is_err() {
            warn!("store writer closed, record dropped");
        }
    }

    /// Queue a delete.
    pub fn remove(&self, key: impl Into<String>) {
        if self.tx.send(StoreOp::Remove { key: key.into() }).is_err() {
            warn!("store writer closed, delete dropped");
        }
    }

    /// Wait until everything queued so far has been written.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(StoreOp::Flush(tx))
            .map_err(|_| StoreError::WriterClosed)?;
        rx.await.map_err(|_| StoreError::WriterClosed)
    }

    /// A handle whose ops are silently discarded. For rooms that must not
    /// persist (tests, throwaway demos).
    pub fn detached() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<StoreOp<R>>();
        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                if let StoreOp::Flush(reply) = op {
                    let _ = reply.send(());
                }
            }
        });
        Self { tx }
    }
}

/// Spawn the writer task. It exits once every [`StoreHandle`] is dropped.
pub fn spawn_writer<S, C, R>(store: Arc<S>, codec: C) -> (StoreHandle<R>, JoinHandle<()>)
where
    S: RecordStore,
    C: Codec,
    R: Serialize + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreOp<R>>();

    let task = tokio::spawn(async move {
        info!("store writer started");
        while let Some(op) = rx.recv().await {
            match op {
                StoreOp::Save { key, record } => {
                    let bytes = match codec.encode(&record) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!(%key, error = %e, "failed to encode record");
                            continue;
                        }
                    };
                    let store = Arc::clone(&store);
                    let result = run_blocking(move || store.save(&key, &bytes).map(|()| key)).await;
                    match result {
                        Ok(key) => debug!(%key, "record saved"),
                        Err(e) => warn!(error = %e, "record save failed"),
                    }
                }
                StoreOp::Remove { key } => {
                    let store = Arc::clone(&store);
                    let result = run_blocking(move || store.remove(&key).map(|()| key)).await;
                    match result {
                        Ok(key) => debug!(%key, "record removed"),
                        Err(e) => warn!(error = %e, "record remove failed"),
                    }
                }
                StoreOp::Flush(reply) => {
                    let _ = reply.send(());
                }
            }
        }
        info!("store writer stopped");
    });

    (StoreHandle { tx }, task)
}

/// Runs blocking file work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join) => Err(StoreError::io(
            "<blocking task>",
            std::io::Error::other(join.to_string()),
        )),
    }
}

/// Load and decode every record in `store`.
///
/// Records that fail to decode are skipped with a warning so that one
/// corrupt file cannot keep the rest of the bar offline.
pub fn load_records<S, C, R>(store: &S, codec: &C) -> Result<Vec<(String, R)>, StoreError>
where
    S: RecordStore,
    C: Codec,
    R: DeserializeOwned,
{
    let mut out = Vec::new();
    for (key, bytes) in store.load_all()? {
        match codec.decode::<R>(&bytes) {
            Ok(record) => out.push((key, record)),
            Err(e) => warn!(%key, error = %e, "skipping undecodable record"),
        }
    }
    Ok(out)
}

