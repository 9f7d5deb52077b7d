//! Pubmine CLI - Command-line interface
//!
//! Usage:
//!   pubmine build --vocabulary <file>... [--cache <file>]
//!   pubmine resolve <phrase>...
//!   pubmine funding <file>... [--json]
//!   pubmine institutions <file>

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pubmine_core::{AppConfig, FundingPair, LoggingConfig};
use pubmine_extractor::{MergedVocabulary, PhraseResolver, TrieCache, VocabularySource};

#[derive(Parser)]
#[command(name = "pubmine")]
#[command(about = "Institution and funding extraction for publication text")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the phrase trie and write its cache
    Build {
        /// Vocabulary JSON files (overrides configuration)
        #[arg(long = "vocabulary")]
        vocabulary: Vec<PathBuf>,
        /// Cache file (overrides configuration)
        #[arg(long)]
        cache: Option<PathBuf>,
    },
    /// Resolve a phrase to its canonical name
    Resolve {
        /// Phrase words
        #[arg(required = true)]
        phrase: Vec<String>,
    },
    /// Extract (agency, grant) pairs from funding sections
    Funding {
        /// Text files, one document each
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },
    /// List institutions mentioned in a text file
    Institutions {
        /// Text file
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct DocumentFunding {
    file: PathBuf,
    funding: Vec<FundingPair>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    if let Commands::Build { vocabulary, .. } = &cli.command {
        if !vocabulary.is_empty() {
            config.vocabulary.paths = vocabulary.clone();
        }
    }
    config.validate()?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Build { cache, .. } => {
            let cache = cache
                .or_else(|| config.vocabulary.cache_path.clone())
                .context("no cache path configured")?;

            let source = MergedVocabulary::from_config(&config.vocabulary);
            let trie = pubmine_extractor::Trie::build(&source.entries()?);
            TrieCache::new(&cache).store(&trie, source.fingerprint()?)?;

            println!(
                "Built trie with {} phrases ({} nodes) -> {}",
                trie.phrase_count(),
                trie.node_count(),
                cache.display()
            );
        }
        Commands::Resolve { phrase } => {
            let resolver = PhraseResolver::from_config(&config)?;
            match resolver.resolve_phrase(&phrase) {
                Some(name) => println!("{}", name),
                None => println!("No match"),
            }
        }
        Commands::Funding { files, json } => {
            let resolver = Arc::new(PhraseResolver::from_config(&config)?);

            let tasks = files.into_iter().map(|file| {
                let resolver = Arc::clone(&resolver);
                tokio::task::spawn_blocking(move || -> anyhow::Result<DocumentFunding> {
                    let text = std::fs::read_to_string(&file)
                        .with_context(|| format!("reading {}", file.display()))?;
                    let funding = resolver.extract_funding(&text).into_iter().collect();
                    Ok(DocumentFunding { file, funding })
                })
            });

            let mut documents = Vec::new();
            for result in futures::future::join_all(tasks).await {
                documents.push(result??);
            }
            info!(documents = documents.len(), "funding extraction complete");

            if json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                for document in &documents {
                    for pair in &document.funding {
                        println!("{}\t{}", document.file.display(), pair);
                    }
                }
            }
        }
        Commands::Institutions { file } => {
            let resolver = PhraseResolver::from_config(&config)?;
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            for name in resolver.institution_names(&text) {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
