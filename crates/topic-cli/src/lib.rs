//! topic-labels library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations
//! - `output`: JSON, CSV and N-Triples serialization

pub mod cli;
pub mod commands;
pub mod output;

pub use cli::{Cli, Commands, CrawlArgs, OutputFormat};
pub use commands::{
    build_catalog, crawl_and_rank, handle_authors, handle_catalog, handle_crawl, handle_label,
    handle_resolve, init_logging, label_documents, load_settings, open_knowledge_base,
    read_catalog, read_documents, resolve_labels, RunContext,
};
pub use output::{author_topics, AuthorTopics, DocumentRecord, TopicRecord};
