//! Streaming loader for gzip-compressed wiki abstract dumps. Each
//! `<doc>` element (children `<title>`, `<url>`, `<abstract>`) becomes a
//! `Document` with a content-derived identifier and is handed to the
//! ingestion queue as soon as it is complete.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use crossbeam::channel::Sender;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::info;

use crate::error::{NautexError, Result};
use crate::models::Document;
use crate::shutdown::CancelToken;

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Url,
    Abstract,
}

#[derive(Default)]
struct PendingDoc {
    title: String,
    url: String,
    abstract_text: String,
}

impl PendingDoc {
    fn build(self) -> Document {
        Document::new(self.title, self.url, self.abstract_text)
    }
}

pub struct DumpLoader {
    path: PathBuf,
}

impl DumpLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Parse the dump and send every document into `tx`. Returns the
    /// number of documents emitted. Cancellation is checked between
    /// documents; a closed receiver also stops the run.
    pub fn stream(&self, tx: &Sender<Document>, cancel: &CancelToken) -> Result<usize> {
        let file = File::open(&self.path)?;
        let mut reader = Reader::from_reader(BufReader::new(GzDecoder::new(file)));

        let mut buf = Vec::new();
        let mut pending: Option<PendingDoc> = None;
        let mut field: Option<Field> = None;
        let mut emitted = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(start) => match start.name().as_ref() {
                    b"doc" => pending = Some(PendingDoc::default()),
                    b"title" => field = Some(Field::Title),
                    b"url" => field = Some(Field::Url),
                    b"abstract" => field = Some(Field::Abstract),
                    _ => field = None,
                },
                Event::Text(text) => {
                    if let (Some(doc), Some(field)) = (pending.as_mut(), field) {
                        let value = text.unescape()?;
                        match field {
                            Field::Title => doc.title.push_str(&value),
                            Field::Url => doc.url.push_str(&value),
                            Field::Abstract => doc.abstract_text.push_str(&value),
                        }
                    }
                }
                Event::End(end) => match end.name().as_ref() {
                    b"doc" => {
                        if let Some(doc) = pending.take() {
                            cancel.check()?;
                            if tx.send(doc.build()).is_err() {
                                // consumers are gone; a cancellation is in flight
                                return Err(NautexError::Canceled);
                            }
                            emitted += 1;
                        }
                    }
                    _ => field = None,
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        info!(count = emitted, path = %self.path.display(), "dump loaded");
        Ok(emitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<feed>
<doc>
<title>Wikipedia: Sans Souci Hotel</title>
<url>https://en.wikipedia.org/wiki/Sans_Souci_Hotel</url>
<abstract>The Sans Souci Hotel was a hotel located in Ballston Spa.</abstract>
</doc>
<doc>
<title>Wikipedia: Rosa (barge)</title>
<url>https://en.wikipedia.org/wiki/Rosa_(barge)</url>
<abstract>Rosa is a French hotel barge of Dutch origin &amp; more.</abstract>
</doc>
</feed>"#;

    fn write_dump(dir: &TempDir, xml: &str) -> PathBuf {
        let path = dir.path().join("dump.xml.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(xml.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    #[test]
    fn test_stream_parses_documents() {
        let dir = TempDir::new().unwrap();
        let path = write_dump(&dir, SAMPLE);

        let (tx, rx) = unbounded();
        let loader = DumpLoader::new(path);
        let count = loader.stream(&tx, &CancelToken::new()).unwrap();
        drop(tx);

        assert_eq!(count, 2);
        let docs: Vec<Document> = rx.iter().collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "Wikipedia: Sans Souci Hotel");
        assert!(docs[0].abstract_text.contains("Ballston Spa"));
        assert_eq!(docs[1].abstract_text, "Rosa is a French hotel barge of Dutch origin & more.");
        assert_eq!(docs[0].id.len(), 32);
        assert_ne!(docs[0].id, docs[1].id);
    }

    #[test]
    fn test_cancellation_stops_the_stream() {
        let dir = TempDir::new().unwrap();
        let path = write_dump(&dir, SAMPLE);

        let (tx, _rx) = unbounded();
        let cancel = CancelToken::new();
        cancel.cancel();

        let loader = DumpLoader::new(path);
        assert!(matches!(
            loader.stream(&tx, &cancel),
            Err(NautexError::Canceled)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let (tx, _rx) = unbounded();
        let loader = DumpLoader::new(PathBuf::from("/nonexistent/dump.xml.gz"));
        assert!(matches!(
            loader.stream(&tx, &CancelToken::new()),
            Err(NautexError::Io(_))
        ));
    }
}
