//! Interactive query loop. Each line is a bag-of-words query; results
//! print with match counts and per-phase timings. Errors show as one-line
//! diagnostics and leave earlier output on screen.

use std::io;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

use crate::error::{NautexError, Result};
use crate::index::Engine;
use crate::search::SearchService;
use crate::storage::DocStore;

const PROMPT: &str = "nautex> ";

pub fn run(
    service: &SearchService,
    engine: &Engine,
    docs: &DocStore,
    mut max_results: usize,
) -> Result<()> {
    let mut rl = DefaultEditor::new()
        .map_err(|err| NautexError::Io(io::Error::new(io::ErrorKind::Other, err.to_string())))?;

    println!("enter a query, :max N, :stats, :delete <id>, or :quit");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(rest) = line.strip_prefix(':') {
                    if !command(rest, engine, docs, &mut max_results) {
                        break;
                    }
                    continue;
                }

                match service.search(line, max_results) {
                    Ok(result) => print_result(&result),
                    Err(err) => eprintln!("search failed: {err}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("input error: {err}");
                break;
            }
        }
    }

    info!("interactive session closed");
    Ok(())
}

/// Handle a `:command` line; returns false when the loop should exit.
fn command(line: &str, engine: &Engine, docs: &DocStore, max_results: &mut usize) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("quit") | Some("q") => return false,
        Some("max") => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => {
                *max_results = n;
                println!("max results set to {n}");
            }
            _ => eprintln!("usage: :max <positive number>"),
        },
        Some("stats") => match engine.index.analyze() {
            Some(stats) => print!("{stats}"),
            None => eprintln!("the kv engine has no structural analysis"),
        },
        Some("delete") => match parts.next() {
            Some(doc_id) => delete(engine, docs, doc_id),
            None => eprintln!("usage: :delete <doc id>"),
        },
        _ => eprintln!("unknown command: :{line}"),
    }
    true
}

fn delete(engine: &Engine, docs: &DocStore, doc_id: &str) {
    let Some(kv) = engine.kv.as_ref() else {
        eprintln!("deletion is only supported by the kv engine");
        return;
    };
    if let Err(err) = kv.remove_document(doc_id) {
        eprintln!("failed to remove postings: {err}");
        return;
    }
    if let Err(err) = docs.remove(doc_id) {
        eprintln!("failed to remove document blob: {err}");
        return;
    }
    println!("deleted {doc_id}");
}

fn print_result(result: &crate::models::SearchResult) {
    if result.results.is_empty() {
        println!("no matches");
    }
    for (rank, row) in result.results.iter().enumerate() {
        println!(
            "{:>3}. [{} unique / {} total] {}",
            rank + 1,
            row.unique_matches,
            row.total_matches,
            row.document.title,
        );
        println!("     {}", row.document.url);
    }
    println!(
        "{} of {} matches shown",
        result.results.len(),
        result.total_results_count
    );

    let mut phases: Vec<_> = result.timings.iter().collect();
    phases.sort_by_key(|(name, _)| name.as_str());
    let line: Vec<String> = phases
        .iter()
        .map(|(name, took)| format!("{name}={took:?}"))
        .collect();
    println!("timings: {}", line.join(" "));
}
