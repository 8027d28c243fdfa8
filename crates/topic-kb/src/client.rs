//! HTTP knowledge-base client for MediaWiki/Wikibase endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use topic_types::KnowledgeBaseSettings;

use crate::error::KbError;
use crate::wire::{ApiError, EntitiesResponse, EntityDetail, SearchHit, SearchResponse};
use crate::KnowledgeBase;

/// Longest error body echoed into a lookup failure.
const MAX_ERROR_BODY: usize = 200;

/// Knowledge-base client backed by the Wikibase action API.
///
/// Requests carry the configured timeout and are limited to
/// `max_concurrent_requests` in flight. Failures are returned, never retried.
pub struct WikidataClient {
    client: Client,
    config: KnowledgeBaseSettings,
    permits: Arc<Semaphore>,
}

impl WikidataClient {
    /// Create a new client.
    pub fn new(config: KnowledgeBaseSettings) -> Result<Self, KbError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| KbError::Config(e.to_string()))?;

        let permits = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));

        Ok(Self {
            client,
            config,
            permits,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/api.php", self.config.base_url.trim_end_matches('/'))
    }

    /// Make a single GET request against the action API.
    async fn get<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, &str)],
    ) -> Result<T, KbError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| KbError::lookup(query, "request limiter closed"))?;

        debug!(query, "Knowledge-base request");

        let response = self
            .client
            .get(self.api_url())
            .query(params)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                warn!(query, reason = %reason, "Knowledge-base request failed");
                KbError::lookup(query, reason)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(query, %status, "Knowledge-base returned non-success status");
            return Err(KbError::lookup(query, format!("HTTP {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| KbError::Parse(e.to_string()))
    }
}

fn api_failure(query: &str, error: ApiError) -> KbError {
    KbError::lookup(query, format!("API error {}: {}", error.code, error.info))
}

#[async_trait]
impl KnowledgeBase for WikidataClient {
    async fn search(&self, label: &str) -> Result<Vec<SearchHit>, KbError> {
        let params = [
            ("action", "wbsearchentities"),
            ("search", label),
            ("language", self.config.language.as_str()),
            ("format", "json"),
        ];
        let response: SearchResponse = self.get(label, &params).await?;
        if let Some(error) = response.error {
            return Err(api_failure(label, error));
        }
        Ok(response.search)
    }

    async fn entity(&self, id: &str) -> Result<EntityDetail, KbError> {
        let params = [
            ("action", "wbgetentities"),
            ("ids", id),
            ("languages", self.config.language.as_str()),
            ("props", "labels|descriptions|aliases|claims"),
            ("format", "json"),
        ];
        let response: EntitiesResponse = self.get(id, &params).await?;
        if let Some(error) = response.error {
            return Err(api_failure(id, error));
        }

        let detail = response
            .entities
            .into_iter()
            .find_map(|(key, detail)| (key == id).then_some(detail))
            .ok_or_else(|| KbError::MissingEntity(id.to_string()))?;

        if detail.missing {
            return Err(KbError::MissingEntity(id.to_string()));
        }
        Ok(detail)
    }

    fn language(&self) -> &str {
        &self.config.language
    }
}
