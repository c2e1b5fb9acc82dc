//! Hash-array-mapped trie: 32-way bitmap-compressed nodes, 5 hash bits per
//! level, fixed depth 7 over a 32-bit FNV-1a hash. Internal nodes and
//! terminals live in separate append-only arenas; "pointers" are indices.
//! Terminal buckets hold key-sorted entries and resolve both the leftover
//! two hash bits and full 32-bit collisions by string equality.

use parking_lot::RwLock;

use super::{bump_sorted, sorted_to_postings, Postings, TermIndex, TrieStats};
use crate::error::Result;
use crate::index::stats::StatsBuilder;
use crate::models::DocId;

/// Hash bits consumed per level.
const QUANT: u32 = 5;
const LOWER_BITS: u32 = (1 << QUANT) - 1;
/// ceil(32 / 5): six internal levels plus the terminal level.
const DEPTH: usize = 7;

type NodePtr = u32;

/// FNV-1a over the key's UTF-8 bytes. The 32-bit variant is load-bearing:
/// slot indices are 5-bit slices of exactly this hash.
fn fnv1a_32(key: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[derive(Default)]
struct Node {
    /// Bit i set means slot i is occupied; the child sits at
    /// `popcount(bitmap & ((1 << i) - 1))` in the dense array.
    bitmap: u32,
    children: Vec<NodePtr>,
}

#[derive(Default)]
struct Terminal {
    /// Sorted by key; looked up by full-string equality.
    entries: Vec<(String, Vec<(DocId, u32)>)>,
}

impl Terminal {
    fn append(&mut self, key: &str, doc_id: &str) {
        match self
            .entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
        {
            Ok(at) => bump_sorted(&mut self.entries[at].1, doc_id),
            Err(at) => self
                .entries
                .insert(at, (key.to_string(), vec![(doc_id.to_string(), 1)])),
        }
    }

    fn find(&self, key: &str) -> Option<&[(DocId, u32)]> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|at| self.entries[at].1.as_slice())
    }
}

struct Arena {
    nodes: Vec<Node>,
    terms: Vec<Terminal>,
}

impl Arena {
    fn with_root() -> Self {
        Self {
            nodes: vec![Node::default()],
            terms: Vec::new(),
        }
    }

    fn new_node(&mut self) -> NodePtr {
        self.nodes.push(Node::default());
        (self.nodes.len() - 1) as NodePtr
    }

    fn new_term(&mut self) -> NodePtr {
        self.terms.push(Terminal::default());
        (self.terms.len() - 1) as NodePtr
    }

    /// Occupy `slot` on `at`, splicing `child` into the dense array at its
    /// popcount position.
    fn link(&mut self, at: NodePtr, slot: u32, child: NodePtr) {
        let node = &mut self.nodes[at as usize];
        let mask = 1u32 << slot;
        node.bitmap |= mask;
        let dense = (node.bitmap & (mask - 1)).count_ones() as usize;
        node.children.insert(dense, child);
    }

    /// Follow the child for the lowest 5 bits of `hash`, if present.
    fn next_node(&self, at: NodePtr, hash: u32) -> Option<NodePtr> {
        let node = &self.nodes[at as usize];
        let mask = 1u32 << (hash & LOWER_BITS);
        if node.bitmap & mask == 0 {
            return None;
        }
        let dense = (node.bitmap & (mask - 1)).count_ones() as usize;
        Some(node.children[dense])
    }

    fn insert(&mut self, key: &str, doc_id: &str) {
        let mut hash = fnv1a_32(key);
        let mut node: NodePtr = 0;

        for _ in 0..DEPTH - 2 {
            node = match self.next_node(node, hash) {
                Some(next) => next,
                None => {
                    let fresh = self.new_node();
                    self.link(node, hash & LOWER_BITS, fresh);
                    fresh
                }
            };
            hash >>= QUANT;
        }

        // the last internal level points at a terminal bucket
        let term = match self.next_node(node, hash) {
            Some(term) => term,
            None => {
                let fresh = self.new_term();
                self.link(node, hash & LOWER_BITS, fresh);
                fresh
            }
        };

        self.terms[term as usize].append(key, doc_id);
    }

    fn lookup(&self, key: &str) -> Postings {
        let mut hash = fnv1a_32(key);
        let mut node: NodePtr = 0;

        for _ in 0..DEPTH - 1 {
            match self.next_node(node, hash) {
                Some(next) => node = next,
                None => return Postings::new(),
            }
            hash >>= QUANT;
        }

        match self.terms[node as usize].find(key) {
            Some(docs) => sorted_to_postings(docs),
            None => Postings::new(),
        }
    }
}

pub struct HamtIndex {
    arena: RwLock<Arena>,
}

impl HamtIndex {
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Arena::with_root()),
        }
    }
}

impl Default for HamtIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TermIndex for HamtIndex {
    fn insert(&self, key: &str, doc_id: &str) -> Result<()> {
        self.arena.write().insert(key, doc_id);
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Postings> {
        Ok(self.arena.read().lookup(key))
    }

    fn analyze(&self) -> Option<TrieStats> {
        let arena = self.arena.read();
        let mut builder = StatsBuilder::default();
        // internal levels are 0..=5; children of level 5 are terminals
        let mut stack: Vec<(NodePtr, usize)> = vec![(0, 0)];
        while let Some((ptr, depth)) = stack.pop() {
            if depth == DEPTH - 1 {
                let term = &arena.terms[ptr as usize];
                let postings: usize = term.entries.iter().map(|(_, docs)| docs.len()).sum();
                builder.visit_leaf(depth, postings);
                continue;
            }
            let node = &arena.nodes[ptr as usize];
            builder.visit(depth, node.children.len(), 0, false);
            for &child in &node.children {
                stack.push((child, depth + 1));
            }
        }
        Some(builder.finish(DEPTH))
    }
}
