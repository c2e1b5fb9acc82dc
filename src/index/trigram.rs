//! Fixed-depth trigram trie: three levels of exactly 26 children each,
//! indexed by `byte - b'a'`. Keys outside three lowercase ASCII letters
//! are rejected with `InvalidKey`.

use parking_lot::RwLock;

use super::{Postings, TermIndex, TrieStats};
use crate::error::{NautexError, Result};
use crate::index::stats::StatsBuilder;

const FANOUT: usize = 26;

struct Node {
    children: [Option<Box<Node>>; FANOUT],
    postings: Postings,
}

impl Node {
    fn new() -> Self {
        Self {
            children: std::array::from_fn(|_| None),
            postings: Postings::new(),
        }
    }
}

/// Slot indices for a valid trigram, or `InvalidKey`.
fn slots(key: &str) -> Result<[usize; 3]> {
    let bytes = key.as_bytes();
    if bytes.len() != 3 {
        return Err(NautexError::InvalidKey(key.to_string()));
    }
    let mut slots = [0usize; 3];
    for (slot, &byte) in slots.iter_mut().zip(bytes) {
        if !byte.is_ascii_lowercase() {
            return Err(NautexError::InvalidKey(key.to_string()));
        }
        *slot = usize::from(byte - b'a');
    }
    Ok(slots)
}

pub struct TrigramIndex {
    root: RwLock<Node>,
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::new()),
        }
    }
}

impl Default for TrigramIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TermIndex for TrigramIndex {
    fn insert(&self, key: &str, doc_id: &str) -> Result<()> {
        let slots = slots(key)?;
        let mut root = self.root.write();

        let mut node = &mut *root;
        for slot in slots {
            node = node.children[slot]
                .get_or_insert_with(|| Box::new(Node::new()))
                .as_mut();
        }
        *node.postings.entry(doc_id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Postings> {
        let slots = slots(key)?;
        let root = self.root.read();

        let mut node = &*root;
        for slot in slots {
            match &node.children[slot] {
                Some(child) => node = child.as_ref(),
                None => return Ok(Postings::new()),
            }
        }
        Ok(node.postings.clone())
    }

    fn analyze(&self) -> Option<TrieStats> {
        let root = self.root.read();
        let mut builder = StatsBuilder::default();
        walk(&root, 0, &mut builder);
        Some(builder.finish(3))
    }
}

fn walk(node: &Node, depth: usize, builder: &mut StatsBuilder) {
    let children = node.children.iter().flatten().count();
    builder.visit(depth, children, node.postings.len(), !node.postings.is_empty());
    for child in node.children.iter().flatten() {
        walk(child, depth + 1, builder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_lookup_round_trip() {
        let index = TrigramIndex::new();
        index.insert("hot", "d1").unwrap();
        index.insert("hot", "d1").unwrap();
        index.insert("ote", "d1").unwrap();

        assert_eq!(index.lookup("hot").unwrap().get("d1"), Some(&2));
        assert_eq!(index.lookup("ote").unwrap().get("d1"), Some(&1));
        assert!(index.lookup("tel").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let index = TrigramIndex::new();
        assert!(matches!(
            index.insert("ho", "d1"),
            Err(NautexError::InvalidKey(_))
        ));
        assert!(matches!(
            index.insert("hote", "d1"),
            Err(NautexError::InvalidKey(_))
        ));
        assert!(matches!(
            index.lookup("hotel"),
            Err(NautexError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_rejects_alphabet_violations() {
        let index = TrigramIndex::new();
        assert!(index.insert("h0t", "d1").is_err());
        assert!(index.insert("Hot", "d1").is_err());
        assert!(index.insert("höt", "d1").is_err());
        assert!(index.insert("h t", "d1").is_err());
    }

    #[test]
    fn test_stored_keys_all_valid() {
        let index = TrigramIndex::new();
        for key in ["abc", "zzz", "mno"] {
            index.insert(key, "d1").unwrap();
        }
        let stats = index.analyze().unwrap();
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.leaves, 3);
    }

    #[test]
    fn test_distinct_docs_counted_separately() {
        let index = TrigramIndex::new();
        index.insert("spa", "d1").unwrap();
        index.insert("spa", "d2").unwrap();
        index.insert("spa", "d2").unwrap();

        let postings = index.lookup("spa").unwrap();
        assert_eq!(postings.get("d1"), Some(&1));
        assert_eq!(postings.get("d2"), Some(&2));
    }
}
