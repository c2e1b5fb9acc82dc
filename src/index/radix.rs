//! Path-compressed radix trie with per-terminal posting maps.
//!
//! Invariant: no two siblings share a non-empty common prefix, and the
//! concatenated prefixes along the path to a terminal node spell exactly
//! the stored key.

use parking_lot::RwLock;

use super::{Postings, TermIndex, TrieStats};
use crate::error::Result;
use crate::index::stats::StatsBuilder;

struct Node {
    prefix: String,
    terminal: bool,
    postings: Postings,
    children: Vec<Node>,
}

impl Node {
    fn new(prefix: String) -> Self {
        Self {
            prefix,
            terminal: false,
            postings: Postings::new(),
            children: Vec::new(),
        }
    }

    fn new_terminal(prefix: String, doc_id: &str) -> Self {
        let mut node = Self::new(prefix);
        node.mark(doc_id);
        node
    }

    fn mark(&mut self, doc_id: &str) {
        self.terminal = true;
        *self.postings.entry(doc_id.to_string()).or_insert(0) += 1;
    }
}

/// Longest common prefix length, in bytes.
fn lcp(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

pub struct RadixIndex {
    root: RwLock<Node>,
}

impl RadixIndex {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::new(String::new())),
        }
    }
}

impl Default for RadixIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_at(node: &mut Node, rest: &str, doc_id: &str) {
    for i in 0..node.children.len() {
        let p = lcp(rest, &node.children[i].prefix);
        if p == 0 {
            continue;
        }

        // child prefix fully consumed: descend or land exactly here
        if p == node.children[i].prefix.len() {
            if p == rest.len() {
                node.children[i].mark(doc_id);
            } else {
                insert_at(&mut node.children[i], &rest[p..], doc_id);
            }
            return;
        }

        // partial overlap: split the edge at the common prefix
        let common = rest[..p].to_string();
        let mut old = std::mem::replace(&mut node.children[i], Node::new(common));
        old.prefix = old.prefix[p..].to_string();

        let middle = &mut node.children[i];
        middle.children.push(old);

        if p == rest.len() {
            // the new key ends exactly at the split point
            middle.mark(doc_id);
        } else {
            middle
                .children
                .push(Node::new_terminal(rest[p..].to_string(), doc_id));
        }
        return;
    }

    // no child shares a prefix: attach the whole remainder
    node.children
        .push(Node::new_terminal(rest.to_string(), doc_id));
}

impl TermIndex for RadixIndex {
    fn insert(&self, key: &str, doc_id: &str) -> Result<()> {
        let mut root = self.root.write();
        insert_at(&mut root, key, doc_id);
        Ok(())
    }

    fn lookup(&self, key: &str) -> Result<Postings> {
        let root = self.root.read();
        let mut node = &*root;
        let mut rest = key;

        'descend: loop {
            for child in &node.children {
                let p = lcp(rest, &child.prefix);
                if p == 0 {
                    continue;
                }
                if p == rest.len() {
                    // exact only when the full edge is consumed too;
                    // a proper-prefix landing is not a match
                    if p == child.prefix.len() && child.terminal {
                        return Ok(child.postings.clone());
                    }
                    return Ok(Postings::new());
                }
                if p == child.prefix.len() {
                    node = child;
                    rest = &rest[p..];
                    continue 'descend;
                }
                // diverged inside the edge
                return Ok(Postings::new());
            }
            return Ok(Postings::new());
        }
    }

    fn analyze(&self) -> Option<TrieStats> {
        let root = self.root.read();
        let mut builder = StatsBuilder::default();
        walk(&root, 0, &mut builder);
        Some(builder.finish(3))
    }
}

fn walk(node: &Node, depth: usize, builder: &mut StatsBuilder) {
    builder.visit(depth, node.children.len(), node.postings.len(), node.terminal);
    for child in &node.children {
        walk(child, depth + 1, builder);
    }
}
