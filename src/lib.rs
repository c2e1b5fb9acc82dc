pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod repl;
pub mod search;
pub mod shutdown;
pub mod storage;

pub use config::{Config, Env, FtsEngine, Mode, TrieType};
pub use error::{NautexError, Result};
pub use index::{Engine, KeyGen, Postings, TermIndex, TrieStats};
pub use models::{DocId, Document, ResultData, SearchResult};
pub use pipeline::Pipeline;
pub use search::SearchService;
pub use shutdown::CancelToken;
pub use storage::{DocStore, DocWriter, StorageEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
