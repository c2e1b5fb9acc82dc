//! Arena form of the radix trie: nodes live in one append-only vector and
//! children are indices into it. Same observable semantics as the pointer
//! form; the payoff is per-node allocation removal and a compact working
//! set. Postings are small sorted vectors scanned/spliced in place.

use parking_lot::RwLock;

use super::{bump_sorted, sorted_to_postings, Postings, TermIndex, TrieStats};
use crate::error::Result;
use crate::index::stats::StatsBuilder;
use crate::models::DocId;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Default)]
struct Node {
    prefix: String,
    terminal: bool,
    docs: Vec<(DocId, u32)>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn with_root() -> Self {
        let mut arena = Arena::default();
        arena.alloc(String::new());
        arena
    }

    fn alloc(&mut self, prefix: String) -> NodeId {
        self.nodes.push(Node {
            prefix,
            ..Node::default()
        });
        self.nodes.len() - 1
    }

    fn mark(&mut self, node: NodeId, doc_id: &str) {
        self.nodes[node].terminal = true;
        bump_sorted(&mut self.nodes[node].docs, doc_id);
    }

    fn insert(&mut self, key: &str, doc_id: &str) {
        let mut current = ROOT;
        let mut rest = key;

        'descend: loop {
            for slot in 0..self.nodes[current].children.len() {
                let child = self.nodes[current].children[slot];
                let p = lcp(rest, &self.nodes[child].prefix);
                if p == 0 {
                    continue;
                }

                if p == self.nodes[child].prefix.len() {
                    if p == rest.len() {
                        self.mark(child, doc_id);
                        return;
                    }
                    current = child;
                    rest = &rest[p..];
                    continue 'descend;
                }

                // split the edge at the common prefix
                let common = rest[..p].to_string();
                let middle = self.alloc(common);
                self.nodes[child].prefix = self.nodes[child].prefix[p..].to_string();
                self.nodes[middle].children.push(child);
                self.nodes[current].children[slot] = middle;

                if p == rest.len() {
                    self.mark(middle, doc_id);
                } else {
                    let leaf = self.alloc(rest[p..].to_string());
                    self.mark(leaf, doc_id);
                    self.nodes[middle].children.push(leaf);
                }
                return;
            }

            let leaf = self.alloc(rest.to_string());
            self.mark(leaf, doc_id);
            self.nodes[current].children.push(leaf);
            return;
        }
    }

    fn lookup(&self, key: &str) -> Postings {
        let mut current = ROOT;
        let mut rest = key;

        'descend: loop {
            for &child in &self.nodes[current].children {
                let p = lcp(rest, &self.nodes[child].prefix);
                if p == 0 {
                    continue;
                }
                if p == rest.len() {
                    if p == self.nodes[child].prefix.len() && self.nodes[child].terminal {
                        return sorted_to_postings(&self.nodes[child].docs);
                    }
                    return Postings::new();
                }
                if p == self.nodes[child].prefix.len() {
                    current = child;
                    rest = &rest[p..];
                    continue 'descend;
                }
                return Postings::new();
            }
            return Postings::new();
        }
    }
}

fn lcp(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

pub struct SlicedRadixIndex {
    arena: RwLock<Arena>,
}

impl SlicedRadixIndex {
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(Arena::with_root()),
        }
    }
}

impl Default for SlicedRadixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TermIndex for SlicedRadixIndex {
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
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let node = &arena.nodes[node];
            builder.visit(depth, node.children.len(), node.docs.len(), node.terminal);
            for &child in &node.children {
                stack.push((child, depth + 1));
            }
        }
        Some(builder.finish(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pointer_semantics() {
        let index = SlicedRadixIndex::new();
        index.insert("hotel", "d1").unwrap();
        index.insert("hotel", "d1").unwrap();
        index.insert("hotdog", "d2").unwrap();
        index.insert("hot", "d3").unwrap();

        assert_eq!(index.lookup("hotel").unwrap().get("d1"), Some(&2));
        assert_eq!(index.lookup("hotdog").unwrap().get("d2"), Some(&1));
        assert_eq!(index.lookup("hot").unwrap().get("d3"), Some(&1));
        assert!(index.lookup("hote").unwrap().is_empty());
        assert!(index.lookup("ho").unwrap().is_empty());
    }

    #[test]
    fn test_split_on_shorter_new_key() {
        let index = SlicedRadixIndex::new();
        index.insert("saratoga", "d1").unwrap();
        index.insert("sans", "d2").unwrap();
        index.insert("sa", "d3").unwrap();

        assert_eq!(index.lookup("sa").unwrap().get("d3"), Some(&1));
        assert_eq!(index.lookup("sans").unwrap().get("d2"), Some(&1));
        assert_eq!(index.lookup("saratoga").unwrap().get("d1"), Some(&1));
    }

    #[test]
    fn test_commutative_insert_order() {
        let forward = SlicedRadixIndex::new();
        let backward = SlicedRadixIndex::new();
        let keys = ["hotel", "hot", "hotdog", "barge", "bar"];

        for key in keys {
            forward.insert(key, "d1").unwrap();
        }
        for key in keys.iter().rev() {
            backward.insert(key, "d1").unwrap();
        }

        for key in keys {
            assert_eq!(
                forward.lookup(key).unwrap(),
                backward.lookup(key).unwrap(),
                "postings differ for {key}"
            );
        }
    }

    #[test]
    fn test_analyze_matches_inserted_keys() {
        let index = SlicedRadixIndex::new();
        index.insert("spa", "d1").unwrap();
        index.insert("span", "d2").unwrap();

        let stats = index.analyze().unwrap();
        assert_eq!(stats.leaves, 2);
        assert_eq!(stats.total_postings, 2);
        assert_eq!(stats.max_depth, 2); // root -> "spa" -> "n"
    }
}
