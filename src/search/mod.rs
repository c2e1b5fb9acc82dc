//! Glue between the pipeline, one index engine, and the document store:
//! indexing fan-out on one side, ranked query evaluation on the other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::Result;
use crate::index::{KeyGen, TermIndex};
use crate::models::{DocId, ResultData, SearchResult, Timings};
use crate::pipeline::Pipeline;
use crate::storage::DocStore;

pub struct SearchService {
    pipeline: Pipeline,
    index: Arc<dyn TermIndex>,
    keygen: KeyGen,
    docs: DocStore,
}

impl SearchService {
    pub fn new(index: Arc<dyn TermIndex>, keygen: KeyGen, docs: DocStore) -> Self {
        Self {
            pipeline: Pipeline::new(),
            index,
            keygen,
            docs,
        }
    }

    /// Index one document. Best-effort: a key the engine rejects is
    /// logged and skipped, the rest of the document still lands.
    pub fn index_document(&self, doc_id: &str, text: &str) {
        for term in self.pipeline.terms(text) {
            for key in self.keygen.keys(&term) {
                if let Err(err) = self.index.insert(&key, doc_id) {
                    warn!(%key, doc_id, %err, "insert failed, skipping key");
                }
            }
        }
    }

    /// Evaluate a ranked bag-of-words query. Strict: any lookup error
    /// aborts the whole query. A failed document fetch only drops that
    /// row.
    pub fn search(&self, query: &str, max_results: usize) -> Result<SearchResult> {
        let start = Instant::now();
        let mut timings = Timings::new();

        let phase = Instant::now();
        let terms = self.pipeline.collect_terms(query);
        timings.insert("preprocess".to_string(), phase.elapsed());

        let phase = Instant::now();
        let mut unique: HashMap<DocId, u32> = HashMap::new();
        let mut total: HashMap<DocId, u32> = HashMap::new();

        for term in &terms {
            for key in self.keygen.keys(term) {
                let postings = self.index.lookup(&key)?;
                for (doc_id, count) in postings {
                    *unique.entry(doc_id.clone()).or_insert(0) += 1;
                    *total.entry(doc_id).or_insert(0) += count;
                }
            }
        }
        timings.insert("search_tokens".to_string(), phase.elapsed());

        let phase = Instant::now();
        let mut matches: Vec<(DocId, u32, u32)> = unique
            .iter()
            .map(|(doc_id, uniq)| (doc_id.clone(), *uniq, total[doc_id]))
            .collect();
        // more distinct key matches first, then higher total count,
        // then stable by docID
        matches.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(&b.0)));
        timings.insert("sort_results".to_string(), phase.elapsed());

        let phase = Instant::now();
        let total_results_count = matches.len();
        let mut results = Vec::with_capacity(max_results.min(total_results_count));
        for (doc_id, unique_matches, total_matches) in matches.into_iter().take(max_results) {
            match self.docs.get(&doc_id) {
                Ok(Some(document)) => results.push(ResultData {
                    id: doc_id,
                    unique_matches,
                    total_matches,
                    document,
                }),
                Ok(None) => debug!(%doc_id, "match without stored document, dropped"),
                Err(err) => warn!(%doc_id, %err, "document fetch failed, dropped"),
            }
        }
        timings.insert("fetch_documents".to_string(), phase.elapsed());

        timings.insert("total".to_string(), start.elapsed());

        Ok(SearchResult {
            results,
            total_results_count,
            timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RadixIndex;
    use crate::models::Document;
    use crate::storage::StorageEngine;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> (SearchService, DocStore) {
        let engine = StorageEngine::open(dir.path()).unwrap();
        let store = engine.doc_store();
        let service = SearchService::new(
            Arc::new(RadixIndex::new()),
            KeyGen::Word,
            store.clone(),
        );
        (service, store)
    }

    fn seed(service: &SearchService, store: &DocStore, title: &str, text: &str) -> DocId {
        let doc = Document::new(
            title.to_string(),
            format!("https://example.org/{title}"),
            text.to_string(),
        );
        store.put(&doc).unwrap();
        service.index_document(&doc.id, &doc.abstract_text);
        doc.id
    }

    #[test]
    fn test_ranking_prefers_unique_then_total() {
        let dir = TempDir::new().unwrap();
        let (service, store) = service(&dir);

        let both = seed(&service, &store, "both", "hotel barge");
        let many = seed(&service, &store, "many", "hotel hotel hotel");
        let one = seed(&service, &store, "one", "hotel");

        let result = service.search("hotel barge", 10).unwrap();
        assert_eq!(result.total_results_count, 3);
        assert_eq!(result.results[0].id, both);
        assert_eq!(result.results[0].unique_matches, 2);
        assert_eq!(result.results[1].id, many);
        assert_eq!(result.results[1].total_matches, 3);
        assert_eq!(result.results[2].id, one);
    }

    #[test]
    fn test_truncation_keeps_total_count() {
        let dir = TempDir::new().unwrap();
        let (service, store) = service(&dir);

        for i in 0..5 {
            seed(&service, &store, &format!("doc{i}"), "spa resort");
        }

        let result = service.search("spa", 2).unwrap();
        assert_eq!(result.results.len(), 2);
        assert_eq!(result.total_results_count, 5);
    }

    #[test]
    fn test_missing_document_row_is_dropped() {
        let dir = TempDir::new().unwrap();
        let (service, store) = service(&dir);

        let kept = seed(&service, &store, "kept", "barge");
        let ghost = seed(&service, &store, "ghost", "barge");
        store.remove(&ghost).unwrap();

        let result = service.search("barge", 10).unwrap();
        assert_eq!(result.total_results_count, 2);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].id, kept);
    }

    #[test]
    fn test_timings_cover_all_phases() {
        let dir = TempDir::new().unwrap();
        let (service, _store) = service(&dir);

        let result = service.search("anything", 10).unwrap();
        for phase in ["preprocess", "search_tokens", "sort_results", "fetch_documents", "total"] {
            assert!(result.timings.contains_key(phase), "missing {phase} timing");
        }
    }
}
