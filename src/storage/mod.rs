//! fjall-backed storage: one keyspace, a `docs` partition for JSON
//! document blobs and a `words` partition for the KV engine's inverted
//! lists. Atomic per-key writes and batches come from fjall itself.

pub mod doc_store;
pub mod writer;

use std::path::Path;

use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};

use crate::error::Result;

pub use doc_store::DocStore;
pub use writer::DocWriter;

pub struct StorageEngine {
    keyspace: Keyspace,
    docs: PartitionHandle,
    words: PartitionHandle,
}

impl StorageEngine {
    pub fn open(path: &Path) -> Result<Self> {
        let keyspace = fjall::Config::new(path).open()?;
        let docs = keyspace.open_partition("docs", PartitionCreateOptions::default())?;
        let words = keyspace.open_partition("words", PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            docs,
            words,
        })
    }

    pub fn doc_store(&self) -> DocStore {
        DocStore::new(self.docs.clone())
    }

    pub fn doc_writer(&self) -> DocWriter {
        DocWriter::spawn(self.keyspace.clone(), self.docs.clone())
    }

    pub fn keyspace(&self) -> Keyspace {
        self.keyspace.clone()
    }

    pub fn words(&self) -> PartitionHandle {
        self.words.clone()
    }

    /// Fsync everything; called once on clean shutdown.
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}
