//! Result serialization: JSON, CSV and N-Triples.

use std::collections::HashMap;
use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use topic_kb::entity_uri;
use topic_labeling::{DocumentTopics, ScoredTopic};
use topic_types::Document;

/// NLP Interchange Format core ontology.
pub const NIF: &str = "http://persistence.uni-leipzig.org/nlp2rdf/ontologies/nif-core#";
/// Internationalization Tag Set RDF vocabulary.
pub const ITSRDF: &str = "http://www.w3.org/2005/11/its/rdf#";
/// Namespace for nodes minted by this tool.
pub const EDMA: &str = "https://w3id.org/edma#";

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// One output topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub labels: Vec<String>,
    pub external_ids: Vec<String>,
    pub descriptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl TopicRecord {
    pub fn from_scored(scored: &ScoredTopic) -> Self {
        let topic = &scored.topic;
        Self {
            labels: vec![topic.label.clone()],
            external_ids: topic.entity_id.iter().map(|id| entity_uri(id)).collect(),
            descriptions: if topic.description.is_empty() {
                Vec::new()
            } else {
                vec![topic.description.clone()]
            },
            score: Some(scored.weighted_score),
        }
    }

    /// Label used in flat listings.
    pub fn label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("")
    }

    /// Identity for counting: first label plus first external id.
    fn key(&self) -> (String, Option<String>) {
        (self.label().to_string(), self.external_ids.first().cloned())
    }
}

/// One output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub identifier: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub topics: Vec<TopicRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Pair input documents with their extracted topics.
pub fn build_records(documents: &[Document], results: &[DocumentTopics]) -> Vec<DocumentRecord> {
    documents
        .iter()
        .zip(results)
        .map(|(doc, result)| DocumentRecord {
            identifier: doc.id.clone(),
            title: doc.title.clone(),
            authors: doc.authors.clone(),
            source_url: doc.source_url.clone(),
            topics: result.topics.iter().map(TopicRecord::from_scored).collect(),
            error: result.error.clone(),
        })
        .collect()
}

pub fn write_json<W: Write, T: Serialize + ?Sized>(value: &T, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).context("Failed to write JSON")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_csv<W: Write>(records: &[DocumentRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["identifier", "topics"])?;
    for record in records {
        let topics: Vec<&str> = record.topics.iter().map(TopicRecord::label).collect();
        csv.write_record([record.identifier.as_str(), topics.join(" - ").as_str()])?;
    }
    csv.flush().context("Failed to write CSV")?;
    Ok(())
}

fn iri(value: &str) -> String {
    format!("<{value}>")
}

/// Whether `value` may appear between `<` and `>` in N-Triples.
fn is_iri_safe(value: &str) -> bool {
    !value
        .chars()
        .any(|c| c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'))
}

/// Normalised IRI for user-supplied `value`, or `None` if it is not an
/// absolute URL or still contains forbidden characters after normalising.
fn absolute_iri(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    is_iri_safe(url.as_str()).then(|| iri(url.as_str()))
}

/// Node minted for a document without a usable source URL.
fn document_iri(identifier: &str) -> String {
    iri(&format!("{EDMA}document-{}", urlencoding::encode(identifier)))
}

fn context_iri(record: &DocumentRecord) -> String {
    match record.source_url.as_deref() {
        Some(url) => absolute_iri(url).unwrap_or_else(|| {
            warn!(document_id = %record.identifier, url, "Source URL is not a valid IRI, minting a node");
            document_iri(&record.identifier)
        }),
        None => document_iri(&record.identifier),
    }
}

fn literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Node name for a batch of documents: a BLAKE3 digest of the identifiers,
/// so the same batch always maps to the same collection.
fn collection_id(records: &[DocumentRecord]) -> String {
    let mut hasher = blake3::Hasher::new();
    for record in records {
        hasher.update(record.identifier.as_bytes());
        hasher.update(&[0u8]);
    }
    hasher.finalize().to_hex().as_str()[..16].to_string()
}

/// Write the batch as NIF annotations in N-Triples.
///
/// A context collection holds one context per document (its source URL, or
/// a minted node). Each topic is an annotation node on its context.
pub fn write_ntriples<W: Write>(records: &[DocumentRecord], mut writer: W) -> Result<()> {
    let collection = iri(&format!("{EDMA}collection-{}", collection_id(records)));
    let rdf_type = iri(RDF_TYPE);

    writeln!(writer, "{collection} {rdf_type} {} .", iri(&format!("{NIF}ContextCollection")))?;

    for (d, record) in records.iter().enumerate() {
        let context = context_iri(record);
        writeln!(writer, "{collection} {} {context} .", iri(&format!("{NIF}hasContext")))?;
        writeln!(writer, "{context} {rdf_type} {} .", iri(&format!("{NIF}Context")))?;
        writeln!(
            writer,
            "{context} {} {} .",
            iri(&format!("{EDMA}identifier")),
            literal(&record.identifier)
        )?;
        if !record.title.is_empty() {
            writeln!(writer, "{context} {} {} .", iri(RDFS_LABEL), literal(&record.title))?;
        }

        for (t, topic) in record.topics.iter().enumerate() {
            let node = format!("_:d{d}t{t}");
            writeln!(writer, "{context} {} {node} .", iri(&format!("{NIF}annotation")))?;
            writeln!(writer, "{node} {rdf_type} {} .", iri(&format!("{NIF}Annotation")))?;
            for label in &topic.labels {
                writeln!(writer, "{node} {} {} .", iri(RDFS_LABEL), literal(label))?;
            }
            for id in &topic.external_ids {
                match absolute_iri(id) {
                    Some(id) => writeln!(writer, "{node} {} {id} .", iri(&format!("{ITSRDF}taIdentRef")))?,
                    None => warn!(document_id = %record.identifier, id = %id, "Skipping external id that is not a valid IRI"),
                }
            }
            if let Some(score) = topic.score {
                writeln!(
                    writer,
                    "{node} {} \"{score}\"^^{} .",
                    iri(&format!("{ITSRDF}taConfidence")),
                    iri(XSD_DOUBLE)
                )?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Most frequent topics of one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorTopics {
    pub author: String,
    pub topics: Vec<TopicRecord>,
}

/// Topics kept per author.
pub const AUTHOR_TOP_TOPICS: usize = 5;

/// Count topic occurrences over each author's documents and keep the most
/// frequent ones. Ties go to the topic seen first. Authors are sorted by name.
pub fn author_topics(records: &[DocumentRecord], top: usize) -> Vec<AuthorTopics> {
    let mut authors: Vec<&str> = records
        .iter()
        .flat_map(|r| r.authors.iter().map(String::as_str))
        .collect();
    authors.sort_unstable();
    authors.dedup();

    authors
        .into_iter()
        .map(|author| {
            let mut order: Vec<(String, Option<String>)> = Vec::new();
            let mut counts: HashMap<(String, Option<String>), (usize, TopicRecord)> = HashMap::new();

            for record in records.iter().filter(|r| r.authors.iter().any(|a| a == author)) {
                for topic in &record.topics {
                    let key = topic.key();
                    counts
                        .entry(key.clone())
                        .or_insert_with(|| {
                            order.push(key);
                            (
                                0,
                                TopicRecord {
                                    score: None,
                                    ..topic.clone()
                                },
                            )
                        })
                        .0 += 1;
                }
            }

            let mut ranked: Vec<(usize, TopicRecord)> = order
                .iter()
                .filter_map(|key| counts.remove(key))
                .collect();
            // Stable, so first appearance wins ties
            ranked.sort_by(|a, b| b.0.cmp(&a.0));

            AuthorTopics {
                author: author.to_string(),
                topics: ranked.into_iter().take(top).map(|(_, t)| t).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use topic_types::{Topic, TopicSource};

    fn topic(label: &str, id: Option<&str>, score: f64) -> TopicRecord {
        TopicRecord {
            labels: vec![label.to_string()],
            external_ids: id.map(entity_uri).into_iter().collect(),
            descriptions: Vec::new(),
            score: Some(score),
        }
    }

    fn record(id: &str, authors: &[&str], topics: Vec<TopicRecord>) -> DocumentRecord {
        DocumentRecord {
            identifier: id.to_string(),
            title: format!("Title {id}"),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            source_url: None,
            topics,
            error: None,
        }
    }

    #[test]
    fn test_records_from_results() {
        let doc = Document {
            authors: vec!["Ada".into()],
            source_url: Some("https://example.org/PMC1".into()),
            ..Document::new("PMC1", "Viruses")
        };
        let result = DocumentTopics {
            document_id: "PMC1".into(),
            topics: vec![ScoredTopic {
                topic: Topic::new("virus", Some("Q808".into()), "infectious agent", 0.5, TopicSource::EntityLinked),
                weighted_score: 0.5,
            }],
            error: None,
        };

        let records = build_records(&[doc], &[result]);

        assert_eq!(records[0].identifier, "PMC1");
        assert_eq!(records[0].topics[0].labels, vec!["virus"]);
        assert_eq!(records[0].topics[0].external_ids, vec!["http://www.wikidata.org/entity/Q808"]);
        assert_eq!(records[0].topics[0].descriptions, vec!["infectious agent"]);
        assert_eq!(records[0].topics[0].score, Some(0.5));
    }

    #[test]
    fn test_csv_joins_labels() {
        let records = vec![
            record("PMC1", &[], vec![topic("virus", Some("Q808"), 0.5), topic("epidemiology", None, 0.3)]),
            record("PMC2", &[], vec![]),
        ];
        let mut out = Vec::new();
        write_csv(&records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "identifier,topics\nPMC1,virus - epidemiology\nPMC2,\n");
    }

    #[test]
    fn test_json_shape() {
        let records = vec![record("PMC1", &["Ada"], vec![topic("virus", Some("Q808"), 0.5)])];
        let mut out = Vec::new();
        write_json(&records, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["identifier"], "PMC1");
        assert_eq!(value[0]["topics"][0]["labels"][0], "virus");
        assert_eq!(value[0]["topics"][0]["score"], 0.5);
        assert!(value[0].get("error").is_none());
    }

    #[test]
    fn test_ntriples() {
        let records = vec![record("PMC1", &[], vec![topic("say \"hi\"", Some("Q808"), 0.5)])];
        let mut out = Vec::new();
        write_ntriples(&records, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!("<{NIF}ContextCollection>")));
        assert!(text.contains(&format!("<{EDMA}document-PMC1> <{RDF_TYPE}> <{NIF}Context> .")));
        assert!(text.contains(&format!("_:d0t0 <{ITSRDF}taIdentRef> <http://www.wikidata.org/entity/Q808> .")));
        assert!(text.contains(r#""say \"hi\"""#));
        assert!(text.lines().all(|l| l.ends_with(" .")));
    }

    #[test]
    fn test_ntriples_escapes_user_supplied_iris() {
        let mut with_url = record("doc 1", &[], vec![topic("virus", Some("Q808"), 0.5)]);
        with_url.source_url = Some("https://example.org/a b>c".to_string());
        let mut bad_url = record("doc 2", &[], vec![]);
        bad_url.source_url = Some("not a url".to_string());
        let plain = record("doc 3", &[], vec![]);

        let mut out = Vec::new();
        write_ntriples(&[with_url, bad_url, plain], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(&format!("<https://example.org/a%20b%3Ec> <{RDF_TYPE}> <{NIF}Context> .")));
        assert!(text.contains(&format!("<{EDMA}document-doc%202> <{RDF_TYPE}> <{NIF}Context> .")));
        assert!(text.contains(&format!("<{EDMA}document-doc%203> <{RDF_TYPE}> <{NIF}Context> .")));
        assert!(!text.contains("a b>c"));
        assert!(!text.contains("not a url>"));

        // Every IRI term is free of characters N-Triples forbids
        for line in text.lines() {
            for term in line.split(' ').filter(|t| t.starts_with('<')) {
                assert!(term.ends_with('>'), "unterminated IRI in {line}");
                assert!(is_iri_safe(&term[1..term.len() - 1]), "unsafe IRI in {line}");
            }
        }
    }

    #[test]
    fn test_collection_id_depends_only_on_identifiers() {
        let a = vec![record("PMC1", &["Ada"], vec![]), record("PMC2", &[], vec![])];
        let b = vec![record("PMC1", &[], vec![topic("virus", None, 0.1)]), record("PMC2", &["Bob"], vec![])];
        let c = vec![record("PMC12", &[], vec![])];

        assert_eq!(collection_id(&a), collection_id(&b));
        assert_ne!(collection_id(&a), collection_id(&c));
        assert_eq!(collection_id(&a).len(), 16);
        assert!(collection_id(&a).chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_author_topics_counts_and_ties() {
        let records = vec![
            record("1", &["Ada", "Bob"], vec![topic("virus", Some("Q808"), 0.5), topic("vaccine", Some("Q134808"), 0.4)]),
            record("2", &["Ada"], vec![topic("vaccine", Some("Q134808"), 0.9), topic("cell", Some("Q7868"), 0.2)]),
        ];

        let authors = author_topics(&records, AUTHOR_TOP_TOPICS);

        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].author, "Ada");
        let labels: Vec<&str> = authors[0].topics.iter().map(TopicRecord::label).collect();
        assert_eq!(labels, vec!["vaccine", "virus", "cell"]);
        assert!(authors[0].topics.iter().all(|t| t.score.is_none()));

        let labels: Vec<&str> = authors[1].topics.iter().map(TopicRecord::label).collect();
        assert_eq!(labels, vec!["virus", "vaccine"]);
    }

    #[test]
    fn test_author_topics_limit() {
        let topics = (0..8).map(|i| topic(&format!("t{i}"), None, 0.1)).collect();
        let authors = author_topics(&[record("1", &["Ada"], topics)], AUTHOR_TOP_TOPICS);
        assert_eq!(authors[0].topics.len(), 5);
    }
}
