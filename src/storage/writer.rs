use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, tick, Receiver, Sender};
use crossbeam::select;
use fjall::{Keyspace, PartitionHandle};
use tracing::{debug, error, warn};

use crate::error::{NautexError, Result};
use crate::models::Document;

/// Flush once this many documents have accumulated.
const BATCH_SIZE: usize = 1000;
/// ...or when this long has passed since the last flush with a non-empty
/// buffer.
const FLUSH_INTERVAL: Duration = Duration::from_secs(2);

/// Batching document saver. Producers submit documents over a bounded
/// channel; a worker thread accumulates them and commits each batch as a
/// single atomic fjall write. Dropping/closing the writer drains the
/// channel and flushes the final partial batch.
pub struct DocWriter {
    tx: Option<Sender<Document>>,
    handle: Option<JoinHandle<()>>,
}

impl DocWriter {
    pub fn spawn(keyspace: Keyspace, docs: PartitionHandle) -> Self {
        let (tx, rx) = bounded::<Document>(BATCH_SIZE * 2);
        let handle = thread::spawn(move || write_loop(keyspace, docs, rx));
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Queue a document for the next batch. Blocks when the channel is
    /// full; errors only if the worker is gone.
    pub fn submit(&self, doc: Document) -> Result<()> {
        self.tx
            .as_ref()
            .expect("writer already closed")
            .send(doc)
            .map_err(|_| NautexError::Canceled)
    }

    /// Drain and flush, then join the worker.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DocWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn write_loop(keyspace: Keyspace, docs: PartitionHandle, rx: Receiver<Document>) {
    let ticker = tick(FLUSH_INTERVAL);
    let mut buffer: Vec<Document> = Vec::with_capacity(BATCH_SIZE);

    loop {
        select! {
            recv(rx) -> msg => match msg {
                Ok(doc) => {
                    buffer.push(doc);
                    if buffer.len() >= BATCH_SIZE {
                        flush(&keyspace, &docs, &mut buffer);
                    }
                }
                Err(_) => {
                    // channel closed: final drain
                    flush(&keyspace, &docs, &mut buffer);
                    return;
                }
            },
            recv(ticker) -> _ => {
                if !buffer.is_empty() {
                    flush(&keyspace, &docs, &mut buffer);
                }
            }
        }
    }
}

fn flush(keyspace: &Keyspace, docs: &PartitionHandle, buffer: &mut Vec<Document>) {
    if buffer.is_empty() {
        return;
    }
    let count = buffer.len();
    let mut batch = keyspace.batch();
    for doc in buffer.drain(..) {
        match serde_json::to_vec(&doc) {
            Ok(blob) => batch.insert(docs, format!("doc:{}", doc.id), blob),
            Err(err) => warn!(doc_id = %doc.id, %err, "skipping unserializable document"),
        }
    }
    if let Err(err) = batch.commit() {
        error!(%err, "failed to commit document batch");
        return;
    }
    debug!(count, "flushed document batch");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageEngine;
    use tempfile::TempDir;

    #[test]
    fn test_close_flushes_partial_batch() {
        let dir = TempDir::new().unwrap();
        let engine = StorageEngine::open(dir.path()).unwrap();
        let store = engine.doc_store();

        let writer = engine.doc_writer();
        let mut ids = Vec::new();
        for i in 0..25 {
            let doc = Document::new(
                format!("Doc {i}"),
                format!("https://example.org/{i}"),
                format!("abstract number {i}"),
            );
            ids.push(doc.id.clone());
            writer.submit(doc).unwrap();
        }
        writer.close();

        for id in ids {
            assert!(store.get(&id).unwrap().is_some(), "doc {id} not flushed");
        }
    }
}
