use std::fmt;

/// Structural report over a trie engine, produced in `experiment` mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrieStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    pub avg_depth: f64,
    /// Posting entries summed over all terminal nodes.
    pub total_postings: usize,
    pub total_children: usize,
    /// Average child count per node for the first levels
    /// (0..=3 for radix and trigram, 0..=7 for the HAMT).
    pub avg_children_per_level: Vec<f64>,
}

impl fmt::Display for TrieStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes:          {}", self.nodes)?;
        writeln!(f, "leaves:         {}", self.leaves)?;
        writeln!(f, "max depth:      {}", self.max_depth)?;
        writeln!(f, "avg depth:      {:.2}", self.avg_depth)?;
        writeln!(f, "postings:       {}", self.total_postings)?;
        writeln!(f, "total children: {}", self.total_children)?;
        for (level, avg) in self.avg_children_per_level.iter().enumerate() {
            writeln!(f, "avg children at depth {}: {:.2}", level, avg)?;
        }
        Ok(())
    }
}

/// Accumulator shared by the trie `analyze` walks.
#[derive(Default)]
pub(crate) struct StatsBuilder {
    nodes: usize,
    leaves: usize,
    max_depth: usize,
    depth_sum: usize,
    total_postings: usize,
    total_children: usize,
    level_children: Vec<usize>,
    level_nodes: Vec<usize>,
}

impl StatsBuilder {
    pub fn visit(&mut self, depth: usize, children: usize, postings: usize, terminal: bool) {
        self.nodes += 1;
        self.depth_sum += depth;
        self.max_depth = self.max_depth.max(depth);
        if terminal {
            self.leaves += 1;
        }
        self.total_postings += postings;
        self.total_children += children;

        if self.level_children.len() <= depth {
            self.level_children.resize(depth + 1, 0);
            self.level_nodes.resize(depth + 1, 0);
        }
        self.level_children[depth] += children;
        self.level_nodes[depth] += 1;
    }

    /// Leaf-only visit for structures whose terminals carry no child slots.
    pub fn visit_leaf(&mut self, depth: usize, postings: usize) {
        self.leaves += 1;
        self.max_depth = self.max_depth.max(depth);
        self.total_postings += postings;
    }

    pub fn finish(self, report_levels: usize) -> TrieStats {
        let avg_depth = if self.nodes > 0 {
            self.depth_sum as f64 / self.nodes as f64
        } else {
            0.0
        };

        let avg_children_per_level = (0..=report_levels)
            .map(|level| {
                let count = self.level_nodes.get(level).copied().unwrap_or(0);
                if count > 0 {
                    self.level_children[level] as f64 / count as f64
                } else {
                    0.0
                }
            })
            .collect();

        TrieStats {
            nodes: self.nodes,
            leaves: self.leaves,
            max_depth: self.max_depth,
            avg_depth,
            total_postings: self.total_postings,
            total_children: self.total_children,
            avg_children_per_level,
        }
    }
}
