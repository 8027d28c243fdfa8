//! CLI argument parsing for topic-labels.
//!
//! CLI flags override every other configuration source.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use topic_types::CentralityKind;

/// Topic labelling through a knowledge graph
///
/// Labels documents with knowledge-base entities found by crawling the
/// neighbourhood of the entities they mention.
#[derive(Parser, Debug)]
#[command(name = "topic-labels")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/topic-labels/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Answer knowledge-base lookups from a JSON fixture instead of the network
    #[arg(long, global = true)]
    pub kb_fixture: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output serialization
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// One record per document
    #[default]
    Json,
    /// Document id and " - "-joined topic labels
    Csv,
    /// RDF (NIF annotations) as N-Triples
    Ntriples,
}

/// Settings shared by commands that crawl
#[derive(Args, Debug, Clone, Default)]
pub struct CrawlArgs {
    /// Number of documents labelled concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum crawl distance from a seed entity
    #[arg(long)]
    pub max_hops: Option<u32>,

    /// Centrality used to rank candidate labels
    #[arg(long)]
    pub centrality: Option<CentralityKind>,
}

/// Commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract topics for a JSON array of documents
    Label {
        /// Documents file (JSON array)
        input: PathBuf,

        /// Topic catalogue (JSON array of topics, one per model topic)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Extract topics and aggregate the most frequent ones per author
    Authors {
        /// Documents file (JSON array)
        input: PathBuf,

        /// Topic catalogue (JSON array of topics, one per model topic)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Label topic-model topics from their top terms
    Catalog {
        /// Terms file (JSON array of term lists, one per model topic)
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        crawl: CrawlArgs,
    },

    /// Resolve entity strings to knowledge-base identifiers
    Resolve {
        /// Entity strings
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Crawl, reduce and rank the neighbourhood of entity identifiers
    Crawl {
        /// Seed identifiers (e.g. Q42)
        #[arg(required = true)]
        ids: Vec<String>,

        /// Number of ranked nodes to print
        #[arg(short, long, default_value = "10")]
        top: usize,

        #[command(flatten)]
        crawl: CrawlArgs,
    },
}
