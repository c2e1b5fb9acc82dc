use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NautexError, Result};

/// Runtime environment; selects the log format and level.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    Local,
    Dev,
    Prod,
}

/// Which index family backs the search service.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FtsEngine {
    Kv,
    #[default]
    Trie,
}

/// Concrete trie engine when `fts.engine = "trie"`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TrieType {
    #[default]
    Radix,
    RadixSliced,
    Ham,
    Trigram,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Prod,
    /// Index the corpus, print a structural analysis of the trie, exit.
    Experiment,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FtsConfig {
    #[serde(default)]
    pub engine: FtsEngine,
    #[serde(default)]
    pub trie: TrieConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrieConfig {
    #[serde(rename = "type", default)]
    pub trie_type: TrieType,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModeConfig {
    #[serde(rename = "type", default)]
    pub mode: Mode,
}

fn default_dump_path() -> PathBuf {
    PathBuf::from("./data/enwiki-latest-abstract10.xml.gz")
}

fn default_max_results() -> usize {
    10
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub env: Env,
    pub storage_path: PathBuf,
    #[serde(default = "default_dump_path")]
    pub dump_path: PathBuf,
    /// Indexing worker threads; defaults to the logical CPU count.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub fts: FtsConfig,
    #[serde(default)]
    pub mode: ModeConfig,
}

impl Config {
    /// Parse a TOML config file. Unknown enum values are startup errors.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            NautexError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        toml::from_str(&raw)
            .map_err(|err| NautexError::Config(format!("{}: {err}", path.display())))
    }

    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let cfg: Config = toml::from_str(
            r#"
            env = "prod"
            storage_path = "/tmp/nautex"
            dump_path = "/tmp/dump.xml.gz"
            workers = 4

            [fts]
            engine = "trie"

            [fts.trie]
            type = "radix-sliced"

            [mode]
            type = "experiment"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.env, Env::Prod);
        assert_eq!(cfg.fts.engine, FtsEngine::Trie);
        assert_eq!(cfg.fts.trie.trie_type, TrieType::RadixSliced);
        assert_eq!(cfg.mode.mode, Mode::Experiment);
        assert_eq!(cfg.workers(), 4);
    }

    #[test]
    fn test_defaults() {
        let cfg: Config = toml::from_str(r#"storage_path = "/tmp/nautex""#).unwrap();
        assert_eq!(cfg.env, Env::Local);
        assert_eq!(cfg.fts.engine, FtsEngine::Trie);
        assert_eq!(cfg.fts.trie.trie_type, TrieType::Radix);
        assert_eq!(cfg.mode.mode, Mode::Prod);
        assert_eq!(cfg.max_results, 10);
        assert!(cfg.workers() >= 1);
    }

    #[test]
    fn test_unknown_engine_is_an_error() {
        let parsed: std::result::Result<Config, _> = toml::from_str(
            r#"
            storage_path = "/tmp/nautex"
            [fts]
            engine = "btree"
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_ham_and_trigram_names() {
        for (name, expected) in [
            ("ham", TrieType::Ham),
            ("trigram", TrieType::Trigram),
            ("radix", TrieType::Radix),
        ] {
            let cfg: Config = toml::from_str(&format!(
                "storage_path = \"/tmp/x\"\n[fts.trie]\ntype = \"{name}\"\n"
            ))
            .unwrap();
            assert_eq!(cfg.fts.trie.trie_type, expected);
        }
    }
}
