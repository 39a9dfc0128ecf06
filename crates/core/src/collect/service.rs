//! Collection service
//!
//! Drives one job through fetch → publish and reports a per-job outcome.
//! Failures at any stage are logged and isolated: a publish error skips
//! that record only, a fetch error ends the job with whatever was
//! published so far, and nothing here ever aborts a sibling job.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sellersync_domain::CollectionOutcome;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::collect::jobs::CollectionJob;
use crate::collect::ports::MarketDataSource;
use crate::publish::ports::Publisher;

/// Fetches records for a job and forwards them to the sink.
pub struct CollectionService {
    source: Arc<dyn MarketDataSource>,
    publisher: Arc<dyn Publisher>,
}

impl CollectionService {
    pub fn new(source: Arc<dyn MarketDataSource>, publisher: Arc<dyn Publisher>) -> Self {
        Self { source, publisher }
    }

    /// Run one collection cycle for `job`.
    #[instrument(skip(self, job, cancel), fields(job = %job.name()))]
    pub async fn run_job(
        &self,
        job: &CollectionJob,
        cancel: &CancellationToken,
    ) -> CollectionOutcome {
        let started = Instant::now();
        let mut outcome = CollectionOutcome::new(job.name());

        let params = job.params_at(Utc::now());
        let records = match self.source.fetch_all(job.endpoint(), &params, cancel).await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "collection fetch failed");
                outcome.error = Some(err.to_string());
                return outcome.with_elapsed(started.elapsed());
            }
        };

        outcome.fetched = records.len();
        if records.is_empty() {
            info!("no new records");
            return outcome.with_elapsed(started.elapsed());
        }

        for record in &records {
            let value = match serde_json::to_vec(record) {
                Ok(value) => value,
                Err(err) => {
                    warn!(error = %err, "failed to serialize record, skipping");
                    continue;
                }
            };
            match self.publisher.publish(job.topic(), None, &value).await {
                Ok(()) => outcome.published += 1,
                Err(err) => {
                    warn!(topic = %job.topic(), error = %err, "failed to publish record");
                }
            }
        }

        info!(
            fetched = outcome.fetched,
            published = outcome.published,
            topic = %job.topic(),
            "collection cycle finished"
        );
        outcome.with_elapsed(started.elapsed())
    }
}
