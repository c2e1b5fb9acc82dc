//! Inverted lists in the external KV store. One record per key: the key
//! bytes are `word:<term>`, the value is UTF-8 `docID:count` pairs joined
//! by commas, no trailing comma. Inserts merge into the existing entry for
//! the docID, so a list never carries the same document twice.

use fjall::{Keyspace, PartitionHandle};
use parking_lot::RwLock;

use super::{Postings, TermIndex};
use crate::error::Result;
use crate::models::DocId;

const WORD_PREFIX: &str = "word:";

pub struct KvIndex {
    keyspace: Keyspace,
    words: PartitionHandle,
    /// Serializes the read-merge-write cycles. fjall only makes the
    /// individual reads and writes atomic; two writers interleaving on
    /// the same record would drop each other's postings.
    lock: RwLock<()>,
}

impl KvIndex {
    pub fn new(keyspace: Keyspace, words: PartitionHandle) -> Self {
        Self {
            keyspace,
            words,
            lock: RwLock::new(()),
        }
    }

    fn record_key(key: &str) -> String {
        format!("{WORD_PREFIX}{key}")
    }

    /// Remove every posting for `doc_id` across all keys: scan the
    /// `word:` records, rewrite shortened lists, delete emptied ones.
    /// All changes land in one atomic batch.
    pub fn remove_document(&self, doc_id: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut batch = self.keyspace.batch();

        for entry in self.words.prefix(WORD_PREFIX) {
            let (record_key, value) = entry?;
            let entries = parse_entries(&String::from_utf8_lossy(&value));
            let total = entries.len();
            let kept: Vec<(DocId, u32)> = entries
                .into_iter()
                .filter(|(id, _)| id != doc_id)
                .collect();

            if kept.len() == total {
                continue;
            }
            if kept.is_empty() {
                batch.remove(&self.words, record_key);
            } else {
                batch.insert(&self.words, record_key, render_entries(&kept));
            }
        }

        batch.commit()?;
        Ok(())
    }
}

/// Parse a posting list value, preserving entry order and skipping
/// malformed pairs.
fn parse_entries(value: &str) -> Vec<(DocId, u32)> {
    value
        .split(',')
        .filter_map(|pair| {
            let (id, count) = pair.split_once(':')?;
            let count: u32 = count.parse().ok()?;
            if id.is_empty() || count == 0 {
                return None;
            }
            Some((id.to_string(), count))
        })
        .collect()
}

fn render_entries(entries: &[(DocId, u32)]) -> String {
    entries
        .iter()
        .map(|(id, count)| format!("{id}:{count}"))
        .collect::<Vec<_>>()
        .join(",")
}

impl TermIndex for KvIndex {
    fn insert(&self, key: &str, doc_id: &str) -> Result<()> {
        let _guard = self.lock.write();
        let record_key = Self::record_key(key);

        let mut entries = match self.words.get(&record_key)? {
            Some(value) => parse_entries(&String::from_utf8_lossy(&value)),
            None => Vec::new(),
        };

        match entries.iter_mut().find(|(id, _)| id == doc_id) {
            Some((_, count)) => *count += 1,
            None => entries.push((doc_id.to_string(), 1)),
        }

        self.words.insert(record_key, render_entries(&entries))?;
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Postings> {
        let _guard = self.lock.read();
        match self.words.get(Self::record_key(key))? {
            Some(value) => {
                let mut postings = Postings::new();
                for (id, count) in parse_entries(&String::from_utf8_lossy(&value)) {
                    *postings.entry(id).or_insert(0) += count;
                }
                Ok(postings)
            }
            None => Ok(Postings::new()),
        }
    }
}
