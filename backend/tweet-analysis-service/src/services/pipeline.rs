use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use resilience::{with_retry, RetryConfig};
use serde_json::Value;
use tracing::{info, warn};

use super::emotion_classifier::EmotionClassifier;
use super::retrieval::{PostFailure, RetrievalService};
use super::store::{PostStore, StoreError};
use crate::models::{Post, EMOTION_FIELD};
use crate::query::{DateRange, PostQuery, ResultLimit};

#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Hits retrieved for the run, unreadable ones included.
    pub matched: usize,
    /// Posts whose emotion label was written.
    pub processed: usize,
    pub failures: Vec<PostFailure>,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn message(&self) -> String {
        if self.matched == 0 {
            return "No tweets found in the requested date range".to_string();
        }
        let mut message = format!(
            "Processed {} of {} tweets in {:.2}s",
            self.processed,
            self.matched,
            self.elapsed.as_secs_f64()
        );
        if !self.failures.is_empty() {
            message.push_str(&format!(" ({} failed)", self.failures.len()));
        }
        message
    }
}

/// Fetch, classify, write back. Per-Post failures are folded into the report.
pub struct ClassificationPipeline {
    retrieval: RetrievalService,
    classifier: Arc<EmotionClassifier>,
    store: Arc<dyn PostStore>,
    concurrency: usize,
    write_retry: RetryConfig,
}

impl ClassificationPipeline {
    pub fn new(
        store: Arc<dyn PostStore>,
        classifier: Arc<EmotionClassifier>,
        concurrency: usize,
    ) -> Self {
        Self {
            retrieval: RetrievalService::new(store.clone()),
            classifier,
            store,
            concurrency: concurrency.max(1),
            write_retry: resilience::search_write_config(),
        }
    }

    pub fn with_write_retry(mut self, write_retry: RetryConfig) -> Self {
        self.write_retry = write_retry;
        self
    }

    /// Classify every Post in range (up to `limit`).
    ///
    /// Only retrieval errors abort the run. Dropping the returned future stops
    /// new Posts from being started.
    pub async fn run(
        &self,
        range: DateRange,
        limit: ResultLimit,
    ) -> Result<PipelineReport, StoreError> {
        let started = Instant::now();
        let query = PostQuery::new(range, limit);
        let retrieved = self.retrieval.fetch(&query).await?;
        let matched = retrieved.posts.len() + retrieved.unreadable.len();

        info!(
            start = ?range.start,
            end = ?range.end,
            limit = limit.get(),
            matched,
            total_in_range = retrieved.total_matches,
            "starting classification run"
        );

        let (processed, failures) = stream::iter(retrieved.posts)
            .map(|post| self.process(post))
            .buffer_unordered(self.concurrency)
            .fold(
                (0usize, retrieved.unreadable),
                |(processed, mut failures), outcome| async move {
                    match outcome {
                        Ok(()) => (processed + 1, failures),
                        Err(failure) => {
                            failures.push(failure);
                            (processed, failures)
                        }
                    }
                },
            )
            .await;

        let report = PipelineReport {
            matched,
            processed,
            failures,
            elapsed: started.elapsed(),
        };

        info!(
            matched = report.matched,
            processed = report.processed,
            failed = report.failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "classification run finished"
        );

        Ok(report)
    }

    async fn process(&self, post: Post) -> Result<(), PostFailure> {
        let fail = |reason: String| {
            warn!(post_id = %post.id, reason = %reason, "post not classified");
            PostFailure {
                post_id: post.id.clone(),
                reason,
            }
        };

        let emotion = self
            .classifier
            .classify(&post.content)
            .await
            .map_err(|e| fail(e.to_string()))?;

        with_retry(&self.write_retry, StoreError::is_transient, || {
            self.store.update_field(
                &post.document_id,
                EMOTION_FIELD,
                Value::String(emotion.as_str().to_string()),
            )
        })
        .await
        .map_err(|e| fail(format!("emotion update failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(matched: usize, processed: usize, failed: usize) -> PipelineReport {
        PipelineReport {
            matched,
            processed,
            failures: (0..failed)
                .map(|i| PostFailure {
                    post_id: format!("p{i}"),
                    reason: "boom".into(),
                })
                .collect(),
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_message_for_empty_run() {
        let message = report(0, 0, 0).message();
        assert_eq!(message, "No tweets found in the requested date range");
    }

    #[test]
    fn test_message_counts_processed_of_matched() {
        assert_eq!(report(3, 3, 0).message(), "Processed 3 of 3 tweets in 1.50s");
        assert_eq!(
            report(4, 3, 1).message(),
            "Processed 3 of 4 tweets in 1.50s (1 failed)"
        );
    }
}
