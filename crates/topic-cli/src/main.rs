//! topic-labels
//!
//! Labels documents with knowledge-base entities.
//!
//! # Usage
//!
//! ```bash
//! topic-labels label docs.json [--catalog catalog.json] [--format json|csv|ntriples] [-o out]
//! topic-labels authors docs.json [--catalog catalog.json] [-o out]
//! topic-labels catalog terms.json [-o catalog.json]
//! topic-labels resolve "SARS-CoV-2" "influenza"
//! topic-labels crawl Q82069695 --max-hops 1
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/topic-labels/config.toml)
//! 3. Environment variables (TOPICS_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use topic_cli::{
    handle_authors, handle_catalog, handle_crawl, handle_label, handle_resolve, init_logging,
    load_settings, open_knowledge_base, Cli, Commands, CrawlArgs, RunContext,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let crawl: Option<&CrawlArgs> = match &cli.command {
        Commands::Label { crawl, .. }
        | Commands::Authors { crawl, .. }
        | Commands::Catalog { crawl, .. }
        | Commands::Crawl { crawl, .. } => Some(crawl),
        Commands::Resolve { .. } => None,
    };
    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref(), crawl)?;
    init_logging(&settings)?;

    let kb = open_knowledge_base(&settings, cli.kb_fixture.as_deref())?;
    let ctx = RunContext::new(settings, kb);

    match &cli.command {
        Commands::Label {
            input,
            catalog,
            format,
            output,
            ..
        } => {
            handle_label(&ctx, input, catalog.as_deref(), *format, output.as_deref()).await?;
        }
        Commands::Authors {
            input,
            catalog,
            output,
            ..
        } => {
            handle_authors(&ctx, input, catalog.as_deref(), output.as_deref()).await?;
        }
        Commands::Catalog { input, output, .. } => {
            handle_catalog(&ctx, input, output.as_deref()).await?;
        }
        Commands::Resolve { labels } => {
            handle_resolve(&ctx, labels).await?;
        }
        Commands::Crawl { ids, top, .. } => {
            handle_crawl(&ctx, ids, *top).await?;
        }
    }

    Ok(())
}
