//! Command implementations for topic-labels.
//!
//! Handles:
//! - label: extract topics for documents and serialize them
//! - authors: aggregate extracted topics per author
//! - catalog: label topic-model topics from their terms
//! - resolve / crawl: inspect single stages against the knowledge base

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use topic_graph::{centrality_for, largest_component, rank, CrawlConfig, GraphBuilder, GraphError, RankedNode};
use topic_kb::{EntityResolver, InMemoryKnowledgeBase, KnowledgeBase, WikidataClient};
use topic_labeling::{
    CatalogLabeler, GraphLabeler, LabelDispatcher, LabelledTopicModel, PrecomputedTopicModel,
    TopicPipeline,
};
use topic_types::{Document, EntityId, Settings, Topic};

use crate::cli::{CrawlArgs, OutputFormat};
use crate::output::{
    author_topics, build_records, write_csv, write_json, write_ntriples, DocumentRecord,
    AUTHOR_TOP_TOPICS,
};

/// Settings and knowledge base shared by every command.
pub struct RunContext {
    pub settings: Settings,
    pub kb: Arc<dyn KnowledgeBase>,
}

impl RunContext {
    pub fn new(settings: Settings, kb: Arc<dyn KnowledgeBase>) -> Self {
        Self { settings, kb }
    }
}

/// Load layered settings, then apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    crawl: Option<&CrawlArgs>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(crawl) = crawl {
        apply_crawl_args(&mut settings, crawl);
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

fn apply_crawl_args(settings: &mut Settings, crawl: &CrawlArgs) {
    if let Some(workers) = crawl.workers {
        settings.dispatch.workers = workers;
    }
    if let Some(max_hops) = crawl.max_hops {
        settings.crawl.max_hops = max_hops;
    }
    if let Some(centrality) = crawl.centrality {
        settings.labeling.centrality = centrality;
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout only
/// carries results.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// HTTP client, or a fixture-backed stub when `fixture` is given.
pub fn open_knowledge_base(settings: &Settings, fixture: Option<&Path>) -> Result<Arc<dyn KnowledgeBase>> {
    match fixture {
        Some(path) => {
            info!(fixture = %path.display(), "Using knowledge-base fixture");
            let kb = InMemoryKnowledgeBase::from_json_file(path)
                .with_context(|| format!("Failed to load knowledge-base fixture {}", path.display()))?;
            Ok(Arc::new(kb))
        }
        None => {
            info!(base_url = %settings.knowledge_base.base_url, "Using remote knowledge base");
            let client = WikidataClient::new(settings.knowledge_base.clone())
                .context("Failed to create knowledge-base client")?;
            Ok(Arc::new(client))
        }
    }
}

pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse documents from {}", path.display()))
}

pub fn read_catalog(path: &Path) -> Result<Vec<Topic>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse topic catalogue from {}", path.display()))
}

fn read_terms(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse topic terms from {}", path.display()))
}

fn output_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Run the full pipeline over `documents`.
///
/// Ctrl-C stops dispatching further documents; the ones already running
/// finish and the rest are reported as failed.
pub async fn label_documents(
    ctx: &RunContext,
    documents: &[Document],
    catalog: Option<Vec<Topic>>,
) -> Result<Vec<DocumentRecord>> {
    let model = match catalog {
        Some(catalog) => Some(
            LabelledTopicModel::new(
                Arc::new(PrecomputedTopicModel::new(catalog.len())),
                catalog,
                ctx.settings.labeling.num_model_topics_returned,
            )
            .context("Topic catalogue does not match the topic model")?,
        ),
        None => None,
    };

    let pipeline = TopicPipeline::from_settings(ctx.kb.clone(), &ctx.settings, model);

    let token = pipeline.dispatcher().cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, no further documents will be dispatched");
            token.cancel();
        }
    });

    info!(documents = documents.len(), "Extracting topics");
    let results = pipeline.run(documents).await;
    interrupt.abort();
    let results = results.context("Topic extraction failed")?;

    let records = build_records(documents, &results);
    let failed = records.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        warn!(failed, total = records.len(), "Some documents could not be labelled");
    }
    Ok(records)
}

pub async fn handle_label(
    ctx: &RunContext,
    input: &Path,
    catalog: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let documents = read_documents(input)?;
    let catalog = catalog.map(read_catalog).transpose()?;
    let records = label_documents(ctx, &documents, catalog).await?;

    let writer = output_writer(output)?;
    match format {
        OutputFormat::Json => write_json(&records, writer),
        OutputFormat::Csv => write_csv(&records, writer),
        OutputFormat::Ntriples => write_ntriples(&records, writer),
    }
}

pub async fn handle_authors(
    ctx: &RunContext,
    input: &Path,
    catalog: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let documents = read_documents(input)?;
    let catalog = catalog.map(read_catalog).transpose()?;
    let records = label_documents(ctx, &documents, catalog).await?;

    let authors = author_topics(&records, AUTHOR_TOP_TOPICS);
    info!(authors = authors.len(), "Aggregated author topics");
    write_json(&authors, output_writer(output)?)
}

/// Label each model topic from its terms.
pub async fn build_catalog(ctx: &RunContext, topic_terms: &[Vec<String>]) -> Vec<Topic> {
    let resolver = Arc::new(EntityResolver::new(ctx.kb.clone()));
    let labeler = GraphLabeler::from_settings(resolver, &ctx.settings);
    let dispatcher = LabelDispatcher::new(Arc::new(labeler), ctx.settings.dispatch.workers);
    CatalogLabeler::new(dispatcher).label_catalog(topic_terms).await
}

pub async fn handle_catalog(ctx: &RunContext, input: &Path, output: Option<&Path>) -> Result<()> {
    let terms = read_terms(input)?;
    let catalog = build_catalog(ctx, &terms).await;
    write_json(&catalog, output_writer(output)?)
}

/// Resolve each label; unresolvable labels map to `None`.
pub async fn resolve_labels(
    ctx: &RunContext,
    labels: &[String],
) -> Result<Vec<(String, Option<EntityId>)>> {
    let resolver = EntityResolver::new(ctx.kb.clone());
    let mut resolved = Vec::with_capacity(labels.len());
    for label in labels {
        let id = resolver
            .resolve(label)
            .await
            .with_context(|| format!("Failed to resolve '{label}'"))?;
        resolved.push((label.clone(), id));
    }
    Ok(resolved)
}

pub async fn handle_resolve(ctx: &RunContext, labels: &[String]) -> Result<()> {
    let mut out = io::stdout().lock();
    for (label, id) in resolve_labels(ctx, labels).await? {
        writeln!(out, "{}\t{}", label, id.as_deref().unwrap_or("-"))?;
    }
    Ok(())
}

/// Crawl, reduce and rank the neighbourhood of `seeds`.
pub async fn crawl_and_rank(ctx: &RunContext, seeds: &[EntityId], top: usize) -> Result<Vec<RankedNode>> {
    let builder = GraphBuilder::new(ctx.kb.clone(), CrawlConfig::from(&ctx.settings.crawl));
    let graph = builder.build(seeds).await.context("Neighbourhood crawl failed")?;

    let component = match largest_component(&graph) {
        Ok(component) => component,
        Err(GraphError::EmptyGraph) => return Ok(Vec::new()),
        Err(e) => return Err(e).context("Graph reduction failed"),
    };
    info!(
        nodes = graph.node_count(),
        component_nodes = component.node_count(),
        "Reduced neighbourhood graph"
    );

    let stop_set: HashSet<EntityId> = ctx.settings.labeling.stop_entities.iter().cloned().collect();
    let algorithm = centrality_for(ctx.settings.labeling.centrality);
    rank(&component, algorithm.as_ref(), &stop_set, top).context("Ranking failed")
}

pub async fn handle_crawl(ctx: &RunContext, ids: &[String], top: usize) -> Result<()> {
    let ranked = crawl_and_rank(ctx, ids, top).await?;
    let mut out = io::stdout().lock();
    for node in ranked {
        writeln!(
            out,
            "{:.6}\t{}\t{}\t{}",
            node.score, node.entity.id, node.entity.label, node.entity.description
        )?;
    }
    Ok(())
}
