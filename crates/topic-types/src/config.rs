//! Configuration loading for the topic labeller.
//!
//! Layered config: defaults -> user config file -> CLI config file -> env vars -> CLI flags.
//! The user config file lives at `~/.config/topic-labels/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{EntityId, RelationKey};

/// Relation predicates expanded during a crawl unless configured otherwise.
///
/// instance of, subclass of, category's main topic, part of, has use, has part,
/// topic's main category, main subject, studied by, studies.
pub const DEFAULT_RELATIONS: &[&str] = &[
    "P31", "P279", "P301", "P361", "P366", "P527", "P910", "P921", "P2578", "P2579",
];

/// Entities the crawl never enters.
///
/// `Q4167836` (Wikimedia category) links to a huge, meaningless neighbourhood.
pub const DEFAULT_EXCLUDED_ENTITIES: &[&str] = &["Q4167836"];

/// Knowledge-base endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseSettings {
    /// Base URL of the MediaWiki API (the `api.php` script lives below it)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Language for search, labels and descriptions
    #[serde(default = "default_language")]
    pub language: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum in-flight requests across all workers
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://www.wikidata.org/w".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    8
}

fn default_user_agent() -> String {
    concat!("topic-labels/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for KnowledgeBaseSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
            user_agent: default_user_agent(),
        }
    }
}

impl KnowledgeBaseSettings {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Neighbourhood crawl settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    /// Maximum hop distance from a seed
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,

    /// Relation predicates to expand
    #[serde(default = "default_relations")]
    pub relations: Vec<RelationKey>,

    /// Extra predicates appended to `relations`
    #[serde(default)]
    pub additional_relations: Vec<RelationKey>,

    /// Entities that terminate a branch before any lookup
    #[serde(default = "default_excluded_entities")]
    pub excluded_entities: Vec<EntityId>,
}

fn default_max_hops() -> u32 {
    2
}

fn default_relations() -> Vec<RelationKey> {
    DEFAULT_RELATIONS.iter().map(|r| r.to_string()).collect()
}

fn default_excluded_entities() -> Vec<EntityId> {
    DEFAULT_EXCLUDED_ENTITIES
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            relations: default_relations(),
            additional_relations: Vec::new(),
            excluded_entities: default_excluded_entities(),
        }
    }
}

impl CrawlSettings {
    /// All predicates to expand: `relations` then `additional_relations`, deduplicated.
    pub fn expanded_relations(&self) -> Vec<RelationKey> {
        let mut out: Vec<RelationKey> = Vec::new();
        for rel in self.relations.iter().chain(&self.additional_relations) {
            if !out.contains(rel) {
                out.push(rel.clone());
            }
        }
        out
    }
}

/// Centrality algorithm selector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CentralityKind {
    /// Current-flow closeness (information centrality)
    #[default]
    Information,
    /// Shortest-path closeness
    Closeness,
    /// Normalised degree
    Degree,
}

impl std::fmt::Display for CentralityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CentralityKind::Information => write!(f, "information"),
            CentralityKind::Closeness => write!(f, "closeness"),
            CentralityKind::Degree => write!(f, "degree"),
        }
    }
}

impl std::str::FromStr for CentralityKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "information" => Ok(CentralityKind::Information),
            "closeness" => Ok(CentralityKind::Closeness),
            "degree" => Ok(CentralityKind::Degree),
            other => Err(ConfigError::Invalid(format!(
                "unknown centrality algorithm '{other}' (expected information, closeness or degree)"
            ))),
        }
    }
}

/// Graph labelling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelingSettings {
    /// Labels returned per labelled topic
    #[serde(default = "default_num_labels_per_topic")]
    pub num_labels_per_topic: usize,

    /// Entities never returned as labels
    #[serde(default)]
    pub stop_entities: Vec<EntityId>,

    /// Centrality algorithm used to rank neighbourhood nodes
    #[serde(default)]
    pub centrality: CentralityKind,

    /// Topic model topics kept per document before combination
    #[serde(default = "default_num_model_topics_returned")]
    pub num_model_topics_returned: usize,
}

fn default_num_labels_per_topic() -> usize {
    1
}

fn default_num_model_topics_returned() -> usize {
    3
}

impl Default for LabelingSettings {
    fn default() -> Self {
        Self {
            num_labels_per_topic: default_num_labels_per_topic(),
            stop_entities: Vec::new(),
            centrality: CentralityKind::default(),
            num_model_topics_returned: default_num_model_topics_returned(),
        }
    }
}

/// Topic combination settings.
///
/// The weights put topic-model posteriors and centrality scores on a common
/// scale; they are tunables, not a principled calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinerSettings {
    /// Topics kept per document after combination
    #[serde(default = "default_max_num_topics")]
    pub max_num_topics: usize,

    /// Multiplier for entity-linked topics
    #[serde(default = "default_weight_ner")]
    pub weight_ner: f64,

    /// Multiplier for topic-model topics
    #[serde(default = "default_weight_model")]
    pub weight_model: f64,
}

fn default_max_num_topics() -> usize {
    7
}

fn default_weight_ner() -> f64 {
    1.0
}

fn default_weight_model() -> f64 {
    0.5
}

impl Default for CombinerSettings {
    fn default() -> Self {
        Self {
            max_num_topics: default_max_num_topics(),
            weight_ner: default_weight_ner(),
            weight_model: default_weight_model(),
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Documents labelled concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    num_cpus::get().max(1)
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Knowledge-base endpoint
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseSettings,

    /// Neighbourhood crawl
    #[serde(default)]
    pub crawl: CrawlSettings,

    /// Graph labelling
    #[serde(default)]
    pub labeling: LabelingSettings,

    /// Topic combination
    #[serde(default)]
    pub combiner: CombinerSettings,

    /// Worker pool
    #[serde(default)]
    pub dispatch: DispatchSettings,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/topic-labels/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (TOPICS_*, `__` between nested keys)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "topic-labels")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())?
            .set_default("knowledge_base.base_url", default_base_url())?
            .set_default("knowledge_base.language", default_language())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // e.g. TOPICS_CRAWL__MAX_HOPS=1, TOPICS_LABELING__STOP_ENTITIES=Q5,Q35120
        builder = builder.add_source(
            Environment::with_prefix("TOPICS")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("crawl.relations")
                .with_list_parse_key("crawl.additional_relations")
                .with_list_parse_key("crawl.excluded_entities")
                .with_list_parse_key("labeling.stop_entities")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.knowledge_base.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "knowledge_base.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.knowledge_base.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "knowledge_base.max_concurrent_requests must be > 0".to_string(),
            ));
        }
        if self.crawl.expanded_relations().is_empty() {
            return Err(ConfigError::Invalid(
                "crawl.relations must name at least one predicate".to_string(),
            ));
        }
        if self.labeling.num_labels_per_topic == 0 {
            return Err(ConfigError::Invalid(
                "labeling.num_labels_per_topic must be >= 1".to_string(),
            ));
        }
        if self.combiner.max_num_topics == 0 {
            return Err(ConfigError::Invalid(
                "combiner.max_num_topics must be >= 1".to_string(),
            ));
        }
        if !self.combiner.weight_ner.is_finite() || !self.combiner.weight_model.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "combiner weights must be finite, got weight_ner={} weight_model={}",
                self.combiner.weight_ner, self.combiner.weight_model
            )));
        }
        if self.dispatch.workers == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.workers must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.crawl.max_hops, 2);
        assert_eq!(settings.crawl.relations.len(), 10);
        assert_eq!(settings.crawl.excluded_entities, vec!["Q4167836"]);
        assert_eq!(settings.labeling.num_labels_per_topic, 1);
        assert_eq!(settings.labeling.centrality, CentralityKind::Information);
        assert_eq!(settings.combiner.max_num_topics, 7);
        assert!((settings.combiner.weight_ner - 1.0).abs() < f64::EPSILON);
        assert!((settings.combiner.weight_model - 0.5).abs() < f64::EPSILON);
        assert!(settings.dispatch.workers >= 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.knowledge_base.language, "en");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[crawl]
max_hops = 1
additional_relations = ["P136"]

[labeling]
stop_entities = ["Q5"]
centrality = "degree"

[combiner]
weight_model = 0.25
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(settings.crawl.max_hops, 1);
        assert_eq!(settings.crawl.expanded_relations().last().unwrap(), "P136");
        assert_eq!(settings.labeling.stop_entities, vec!["Q5"]);
        assert_eq!(settings.labeling.centrality, CentralityKind::Degree);
        assert!((settings.combiner.weight_model - 0.25).abs() < f64::EPSILON);
        // untouched sections keep defaults
        assert_eq!(settings.combiner.max_num_topics, 7);
    }

    #[test]
    fn test_load_missing_cli_file_fails() {
        assert!(Settings::load(Some("/nonexistent/topic-labels.toml")).is_err());
    }

    #[test]
    fn test_expanded_relations_dedup() {
        let crawl = CrawlSettings {
            relations: vec!["P31".into(), "P279".into()],
            additional_relations: vec!["P279".into(), "P136".into()],
            ..Default::default()
        };
        assert_eq!(crawl.expanded_relations(), vec!["P31", "P279", "P136"]);
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.labeling.num_labels_per_topic = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.combiner.max_num_topics = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.combiner.weight_ner = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.crawl.relations.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.dispatch.workers = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_centrality_kind_parse() {
        assert_eq!(
            "Information".parse::<CentralityKind>().unwrap(),
            CentralityKind::Information
        );
        assert_eq!(
            "closeness".parse::<CentralityKind>().unwrap(),
            CentralityKind::Closeness
        );
        assert!("pagerank".parse::<CentralityKind>().is_err());
        assert_eq!(CentralityKind::Degree.to_string(), "degree");
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.crawl.relations, settings.crawl.relations);
        assert_eq!(decoded.labeling.centrality, settings.labeling.centrality);
    }
}
