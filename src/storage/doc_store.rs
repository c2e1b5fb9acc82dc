use fjall::PartitionHandle;

use crate::error::Result;
use crate::models::Document;

const DOC_PREFIX: &str = "doc:";

/// Read/write access to the JSON document blobs. Absence is typed
/// (`Ok(None)`), never an error.
#[derive(Clone)]
pub struct DocStore {
    docs: PartitionHandle,
}

impl DocStore {
    pub fn new(docs: PartitionHandle) -> Self {
        Self { docs }
    }

    fn key(doc_id: &str) -> String {
        format!("{DOC_PREFIX}{doc_id}")
    }

    pub fn get(&self, doc_id: &str) -> Result<Option<Document>> {
        match self.docs.get(Self::key(doc_id))? {
            Some(blob) => Ok(Some(serde_json::from_slice(&blob)?)),
            None => Ok(None),
        }
    }

    /// Direct, unbatched write. Bulk ingestion goes through `DocWriter`.
    pub fn put(&self, doc: &Document) -> Result<()> {
        let blob = serde_json::to_vec(doc)?;
        self.docs.insert(Self::key(&doc.id), blob)?;
        Ok(())
    }

    pub fn remove(&self, doc_id: &str) -> Result<()> {
        self.docs.remove(Self::key(doc_id))?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.docs.approximate_len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
