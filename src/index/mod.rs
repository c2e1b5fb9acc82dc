//! Index engines. Four interchangeable structures behind one contract:
//! an inverted list in the KV store, a path-compressed radix trie (pointer
//! and arena forms), a hash-array-mapped trie, and a fixed-depth trigram
//! trie. The ranking layer never sees which one is in use.

pub mod hamt;
pub mod kv;
pub mod radix;
pub mod radix_sliced;
pub mod stats;
pub mod trigram;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{FtsConfig, FtsEngine, TrieType};
use crate::error::Result;
use crate::models::DocId;
use crate::storage::StorageEngine;

pub use hamt::HamtIndex;
pub use kv::KvIndex;
pub use radix::RadixIndex;
pub use radix_sliced::SlicedRadixIndex;
pub use stats::TrieStats;
pub use trigram::TrigramIndex;

/// Postings for one key: docID -> occurrence count. Counts are at least 1;
/// a zero-count posting is never stored.
pub type Postings = HashMap<DocId, u32>;

/// Uniform contract over the concrete index structures.
///
/// `insert` merges: the first (key, doc) pair stores count 1, repeats
/// increment. `lookup` is exact-match; a prefix-only match is empty. Both
/// are safe under concurrent readers or a single writer.
pub trait TermIndex: Send + Sync {
    fn insert(&self, key: &str, doc_id: &str) -> Result<()>;

    /// Snapshot of the postings for `key`; the caller may mutate it freely.
    fn lookup(&self, key: &str) -> Result<Postings>;

    /// Structural report, for engines that support it.
    fn analyze(&self) -> Option<TrieStats> {
        None
    }
}

/// Maps a normalized term to the keys actually stored in the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyGen {
    /// The whole term is the key (kv, radix, ham engines).
    Word,
    /// Every length-3 sliding window over the term; terms shorter than
    /// three characters produce no keys.
    Trigram,
}

impl KeyGen {
    pub fn keys(&self, term: &str) -> Vec<String> {
        match self {
            KeyGen::Word => vec![term.to_string()],
            KeyGen::Trigram => trigrams(term),
        }
    }
}

/// Ordered sliding windows of length 3 over the term's characters.
fn trigrams(term: &str) -> Vec<String> {
    let chars: Vec<char> = term.chars().collect();
    if chars.len() < 3 {
        return Vec::new();
    }
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

/// A configured engine: the index behind the uniform interface, its key
/// generator, and (for the KV engine) the concrete handle that supports
/// document deletion.
pub struct Engine {
    pub index: Arc<dyn TermIndex>,
    pub keygen: KeyGen,
    pub kv: Option<Arc<KvIndex>>,
}

impl Engine {
    pub fn from_config(cfg: &FtsConfig, storage: &StorageEngine) -> Self {
        match cfg.engine {
            FtsEngine::Kv => {
                let kv = Arc::new(KvIndex::new(storage.keyspace(), storage.words()));
                Self {
                    index: kv.clone(),
                    keygen: KeyGen::Word,
                    kv: Some(kv),
                }
            }
            FtsEngine::Trie => {
                let (index, keygen): (Arc<dyn TermIndex>, KeyGen) = match cfg.trie.trie_type {
                    TrieType::Radix => (Arc::new(RadixIndex::new()), KeyGen::Word),
                    TrieType::RadixSliced => (Arc::new(SlicedRadixIndex::new()), KeyGen::Word),
                    TrieType::Ham => (Arc::new(HamtIndex::new()), KeyGen::Word),
                    TrieType::Trigram => (Arc::new(TrigramIndex::new()), KeyGen::Trigram),
                };
                Self {
                    index,
                    keygen,
                    kv: None,
                }
            }
        }
    }
}

/// Shared helper for the sorted posting vectors used by the arena engines:
/// binary-search insert keeping doc ids ordered, bumping the count when the
/// doc is already present.
pub(crate) fn bump_sorted(docs: &mut Vec<(DocId, u32)>, doc_id: &str) {
    match docs.binary_search_by(|(id, _)| id.as_str().cmp(doc_id)) {
        Ok(at) => docs[at].1 += 1,
        Err(at) => docs.insert(at, (doc_id.to_string(), 1)),
    }
}

pub(crate) fn sorted_to_postings(docs: &[(DocId, u32)]) -> Postings {
    docs.iter().map(|(id, count)| (id.clone(), *count)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_keys_identity() {
        assert_eq!(KeyGen::Word.keys("hotel"), vec!["hotel"]);
    }

    #[test]
    fn test_trigram_keys_sliding_windows() {
        assert_eq!(KeyGen::Trigram.keys("hotel"), vec!["hot", "ote", "tel"]);
        assert_eq!(KeyGen::Trigram.keys("abc"), vec!["abc"]);
    }

    #[test]
    fn test_short_terms_produce_no_trigrams() {
        assert!(KeyGen::Trigram.keys("ab").is_empty());
        assert!(KeyGen::Trigram.keys("").is_empty());
    }

    #[test]
    fn test_bump_sorted_keeps_order() {
        let mut docs = Vec::new();
        bump_sorted(&mut docs, "b");
        bump_sorted(&mut docs, "a");
        bump_sorted(&mut docs, "b");
        assert_eq!(
            docs,
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }
}
