use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::document::{DocId, Document};

/// Per-phase wall times reported with every search response.
pub type Timings = HashMap<String, Duration>;

/// One ranked search hit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultData {
    pub id: DocId,
    /// How many distinct query-derived keys matched this document.
    pub unique_matches: u32,
    /// Sum of posting counts across those matches.
    pub total_matches: u32,
    pub document: Document,
}

/// Ranked, truncated search response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<ResultData>,
    /// Match count before truncation to the requested maximum.
    pub total_results_count: usize,
    pub timings: Timings,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
