use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use nautex::config::{Config, Env, Mode};
use nautex::index::Engine;
use nautex::ingest;
use nautex::loader::DumpLoader;
use nautex::repl;
use nautex::search::SearchService;
use nautex::shutdown::CancelToken;
use nautex::storage::StorageEngine;

#[derive(Parser)]
#[command(name = "nautex")]
#[command(about = "Full-text search over wiki abstract dumps", long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = "CONFIG_PATH", default_value = "./config/nautex.toml")]
    config: PathBuf,

    /// Override the configured storage directory
    #[arg(long)]
    storage_path: Option<PathBuf>,

    /// Override the configured dump path
    #[arg(long)]
    dump_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = Config::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    if let Some(path) = args.storage_path {
        cfg.storage_path = path;
    }
    if let Some(path) = args.dump_path {
        cfg.dump_path = path;
    }

    init_tracing(cfg.env);
    info!(
        version = nautex::VERSION,
        env = ?cfg.env,
        engine = ?cfg.fts.engine,
        trie = ?cfg.fts.trie.trie_type,
        "starting nautex"
    );

    let storage = StorageEngine::open(&cfg.storage_path)
        .with_context(|| format!("opening storage at {}", cfg.storage_path.display()))?;
    info!(path = %cfg.storage_path.display(), "storage initialised");

    let engine = Engine::from_config(&cfg.fts, &storage);
    let docs = storage.doc_store();
    let service = Arc::new(SearchService::new(
        engine.index.clone(),
        engine.keygen,
        docs.clone(),
    ));

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            info!("shutdown signal received, draining");
            cancel.cancel();
        })
        .context("installing signal handler")?;
    }

    let writer = storage.doc_writer();
    let loader = DumpLoader::new(cfg.dump_path.clone());

    let report = ingest::run(&loader, &service, &writer, cfg.workers(), &cancel);
    writer.close();
    match report {
        Ok(report) => info!(
            loaded = report.loaded,
            indexed = report.indexed,
            "corpus indexed"
        ),
        Err(nautex::NautexError::Canceled) => {
            info!("ingestion canceled, shutting down");
            storage.persist().context("persisting storage")?;
            return Ok(());
        }
        Err(err) => return Err(err).context("indexing the corpus"),
    }

    match cfg.mode.mode {
        Mode::Experiment => match engine.index.analyze() {
            Some(stats) => print!("{stats}"),
            None => println!("the kv engine has no structural analysis"),
        },
        Mode::Prod => {
            repl::run(&service, &engine, &docs, cfg.max_results).context("interactive session")?;
        }
    }

    storage.persist().context("persisting storage")?;
    info!("gracefully stopped");
    Ok(())
}

fn init_tracing(env: Env) {
    use tracing_subscriber::EnvFilter;

    let filter = |level: &str| {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    match env {
        Env::Local => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter("debug"))
            .init(),
        Env::Dev => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter("debug"))
            .init(),
        Env::Prod => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter("info"))
            .init(),
    }
}
