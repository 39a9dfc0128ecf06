//! Immutable registry of collection jobs
//!
//! One job per marketplace endpoint. Jobs are created once at process
//! start from the endpoint catalog and never mutated; the scheduler reads
//! the registry concurrently without locking.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;

use crate::collect::ports::FetchParams;

type ParamsFn = Arc<dyn Fn(DateTime<Utc>) -> FetchParams + Send + Sync>;

/// One named collection job: an endpoint, a sink topic, and the query
/// window builder evaluated at each tick.
#[derive(Clone)]
pub struct CollectionJob {
    name: String,
    endpoint: String,
    topic: String,
    params: ParamsFn,
}

impl CollectionJob {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        topic: impl Into<String>,
        params: impl Fn(DateTime<Utc>) -> FetchParams + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            topic: topic.into(),
            params: Arc::new(params),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Build the fetch parameters for a cycle starting at `now`.
    pub fn params_at(&self, now: DateTime<Utc>) -> FetchParams {
        (self.params)(now)
    }
}

impl fmt::Debug for CollectionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionJob")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("topic", &self.topic)
            .finish()
    }
}

/// Read-only job set constructed once at startup.
#[derive(Debug, Clone)]
pub struct JobRegistry {
    jobs: Vec<Arc<CollectionJob>>,
}

impl JobRegistry {
    pub fn new(jobs: Vec<CollectionJob>) -> Self {
        Self { jobs: jobs.into_iter().map(Arc::new).collect() }
    }

    /// The standard collection set: date-windowed statistics endpoints
    /// plus the paged prices and report-detail sweeps.
    pub fn standard(topic_prefix: &str) -> Self {
        let topic = |name: &str| format!("{topic_prefix}.{name}");

        let jobs = vec![
            CollectionJob::new("orders", "orders", topic("orders"), |now| {
                FetchParams::default()
                    .with_query("dateFrom", date(now - ChronoDuration::hours(24)))
                    .with_query("dateTo", date(now))
                    .with_query("flag", "0")
            }),
            CollectionJob::new("sales", "sales", topic("sales"), |now| {
                FetchParams::default()
                    .with_query("dateFrom", day_start(now - ChronoDuration::hours(24)))
            }),
            CollectionJob::new("stocks", "stocks", topic("stocks"), |now| {
                FetchParams::default()
                    .with_query("dateFrom", date(now - ChronoDuration::hours(24)))
            }),
            CollectionJob::new("incomes", "incomes", topic("incomes"), |now| {
                FetchParams::default()
                    .with_query("dateFrom", date(now - ChronoDuration::hours(24)))
            }),
            CollectionJob::new("prices", "prices", topic("prices"), |_now| {
                FetchParams::default()
            }),
            CollectionJob::new("tariffs", "tariffs", topic("tariffs"), |_now| {
                FetchParams::default()
            }),
            CollectionJob::new("reports", "reports", topic("reports"), |now| {
                FetchParams::default().with_payload(json!({
                    "period": {
                        "begin": date(now - ChronoDuration::days(7)),
                        "end": date(now),
                    },
                    "timezone": "Europe/Moscow",
                    "orderBy": { "field": "ordersSumRub", "mode": "asc" },
                }))
            }),
        ];

        Self::new(jobs)
    }

    pub fn jobs(&self) -> &[Arc<CollectionJob>] {
        &self.jobs
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CollectionJob>> {
        self.jobs.iter().find(|job| job.name() == name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

fn date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

fn day_start(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT00:00:00").to_string()
}
