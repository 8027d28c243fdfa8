//! Parallel, order-preserving dispatch of per-document labelling.
//!
//! Documents are labelled on a bounded pool of tokio tasks. Results are
//! collected by input position, so slot `i` always belongs to document `i`
//! no matter which task finishes first. A failing (or panicking) document
//! only fills its own slot with an error.
//!
//! Cancelling the dispatcher's token stops new documents from being
//! dispatched; documents already running finish normally.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use topic_types::{DocumentEntities, Topic};

use crate::error::LabelError;
use crate::labeler::DocumentLabeler;

/// Outcome for one document.
pub type LabelResult = Result<Vec<Topic>, LabelError>;

enum Slot {
    Running(String, JoinHandle<LabelResult>),
    NotDispatched(String),
}

/// Fans document labelling out over a fixed number of workers.
pub struct LabelDispatcher {
    labeler: Arc<dyn DocumentLabeler>,
    workers: usize,
    cancel: CancellationToken,
}

impl LabelDispatcher {
    /// Create a dispatcher running at most `workers` documents at once.
    pub fn new(labeler: Arc<dyn DocumentLabeler>, workers: usize) -> Self {
        Self {
            labeler,
            workers: workers.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops further dispatching when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Label every document, returning one result per input in input order.
    pub async fn label_all(&self, documents: Vec<DocumentEntities>) -> Vec<LabelResult> {
        let total = documents.len();
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut slots = Vec::with_capacity(total);

        for document in documents {
            let document_id = document.document_id.clone();

            // A worker slot is taken before spawning, so cancellation is
            // observed between dispatches
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = permits.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                slots.push(Slot::NotDispatched(document_id));
                continue;
            };

            let labeler = self.labeler.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                labeler.label(&document).await
            });
            slots.push(Slot::Running(document_id, handle));
        }

        let results = join_all(slots.into_iter().map(|slot| async move {
            match slot {
                Slot::Running(document_id, handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(LabelError::Worker {
                        document_id,
                        reason: e.to_string(),
                    }),
                },
                Slot::NotDispatched(document_id) => Err(LabelError::Cancelled(document_id)),
            }
        }))
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            debug!(failed, "Some documents could not be labelled");
        }
        info!(documents = total, failed, workers = self.workers, "Labelled batch");
        results
    }
}
