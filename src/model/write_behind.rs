//! Write-behind queue between in-memory state and the durable store
//!
//! Callers enqueue writes and return immediately; a single task drains the
//! queue and applies writes in the order they were enqueued. In-memory state is
//! the source of truth for the session. The store lags it by at most the
//! queue's drain time, and `flush` waits until everything enqueued so far has
//! been applied.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::store::{Collection, KeyValueStore, StoreError};

enum WriteOp {
    Put {
        collection: Collection,
        key: String,
        value: Value,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle for enqueueing store writes
#[derive(Clone)]
pub struct StoreWriter {
    tx: mpsc::UnboundedSender<WriteOp>,
}

impl StoreWriter {
    /// Spawn the writer task. Failed writes are logged and, when `failures` is
    /// given, forwarded so the UI can surface them.
    pub fn spawn(
        store: Arc<dyn KeyValueStore>,
        failures: Option<mpsc::UnboundedSender<StoreError>>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteOp>();

        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                match op {
                    WriteOp::Put {
                        collection,
                        key,
                        value,
                    } => {
                        if let Err(e) = store.put(collection, &key, value).await {
                            tracing::warn!(
                                collection = collection.name(),
                                key = %key,
                                error = %e,
                                "Store write failed"
                            );
                            if let Some(failures) = &failures {
                                let _ = failures.send(e);
                            }
                        } else {
                            tracing::trace!(collection = collection.name(), key = %key, "Store write applied");
                        }
                    }
                    WriteOp::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Store writer stopped");
        });

        Self { tx }
    }

    pub fn put(&self, collection: Collection, key: &str, value: Value) {
        let op = WriteOp::Put {
            collection,
            key: key.to_string(),
            value,
        };
        if self.tx.send(op).is_err() {
            tracing::warn!(collection = collection.name(), key, "Store writer is gone, write dropped");
        }
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, collection: Collection, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.put(collection, key, value),
            Err(e) => {
                tracing::error!(collection = collection.name(), key, error = %e, "Could not serialize record");
            }
        }
    }

    /// Wait until every write enqueued before this call has been applied
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteOp::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn get(&self, _: Collection, _: &str) -> Result<Option<Value>, StoreError> {
            Ok(None)
        }

        async fn put(&self, _: Collection, _: &str, _: Value) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".into()))
        }
    }

    #[tokio::test]
    async fn writes_apply_in_enqueue_order() {
        let store = Arc::new(MemoryStore::new());
        let writer = StoreWriter::spawn(store.clone(), None);

        for i in 0..50 {
            writer.put(Collection::Albums, "albums", json!(i));
        }
        writer.flush().await;

        assert_eq!(
            store.get(Collection::Albums, "albums").await.unwrap(),
            Some(json!(49))
        );
    }

    #[tokio::test]
    async fn failures_are_reported() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let writer = StoreWriter::spawn(Arc::new(FailingStore), Some(tx));

        writer.put_json(Collection::CurrentSong, "currentSong", &Value::Null);
        writer.flush().await;

        let err = rx.try_recv().expect("failure should be forwarded");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
