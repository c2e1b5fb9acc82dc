//! Ingestion driver: one producer thread streams the dump into a bounded
//! queue; `W` workers drain it, index each document through the search
//! service, and hand the blob to the batching writer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::bounded;
use tracing::{debug, info};

use crate::error::Result;
use crate::loader::DumpLoader;
use crate::models::Document;
use crate::search::SearchService;
use crate::shutdown::CancelToken;
use crate::storage::DocWriter;

/// Bounded work queue between the loader and the indexing workers.
const QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct IngestReport {
    pub loaded: usize,
    pub indexed: u64,
    pub elapsed: Duration,
}

/// Drive the full ingestion: load, index, persist blobs. Blocks until the
/// dump is exhausted or cancellation fires; either way the workers drain
/// what is already queued.
pub fn run(
    loader: &DumpLoader,
    service: &SearchService,
    writer: &DocWriter,
    workers: usize,
    cancel: &CancelToken,
) -> Result<IngestReport> {
    let start = Instant::now();
    let indexed = AtomicU64::new(0);

    let loaded = thread::scope(|scope| {
        let (tx, rx) = bounded::<Document>(QUEUE_CAPACITY);

        let producer = scope.spawn(move || {
            let result = loader.stream(&tx, cancel);
            drop(tx);
            result
        });

        for worker in 0..workers {
            let rx = rx.clone();
            let indexed = &indexed;
            scope.spawn(move || {
                for doc in rx.iter() {
                    if cancel.is_canceled() {
                        break;
                    }
                    service.index_document(&doc.id, &doc.abstract_text);
                    if writer.submit(doc).is_err() {
                        break;
                    }
                    indexed.fetch_add(1, Ordering::Relaxed);
                }
                debug!(worker, "indexing worker done");
            });
        }
        drop(rx);

        producer.join().expect("loader thread panicked")
    })?;

    let report = IngestReport {
        loaded,
        indexed: indexed.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
    };
    info!(
        loaded = report.loaded,
        indexed = report.indexed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "ingestion finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{KeyGen, RadixIndex};
    use crate::storage::StorageEngine;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_dump(dir: &TempDir, docs: usize) -> std::path::PathBuf {
        let path = dir.path().join("dump.xml.gz");
        let mut xml = String::from("<feed>\n");
        for i in 0..docs {
            xml.push_str(&format!(
                "<doc><title>Doc {i}</title><url>https://example.org/{i}</url>\
                 <abstract>abstract text number {i} hotel</abstract></doc>\n"
            ));
        }
        xml.push_str("</feed>");

        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    #[test]
    fn test_ingest_indexes_and_persists() {
        let dir = TempDir::new().unwrap();
        let dump = write_dump(&dir, 50);

        let engine = StorageEngine::open(&dir.path().join("db")).unwrap();
        let store = engine.doc_store();
        let service = SearchService::new(
            Arc::new(RadixIndex::new()),
            KeyGen::Word,
            store.clone(),
        );

        let writer = engine.doc_writer();
        let loader = DumpLoader::new(dump);
        let report = run(&loader, &service, &writer, 4, &CancelToken::new()).unwrap();
        writer.close();

        assert_eq!(report.loaded, 50);
        assert_eq!(report.indexed, 50);

        let result = service.search("hotel", 100).unwrap();
        assert_eq!(result.total_results_count, 50);
        assert_eq!(result.results.len(), 50);
    }
}
