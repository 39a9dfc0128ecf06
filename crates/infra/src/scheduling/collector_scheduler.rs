//! Interval scheduler for the collection batch.
//!
//! Fires every registered job concurrently on a fixed tick, waits for the
//! whole batch to finish, and repeats until cancelled. Job failures are
//! logged and never stop the scheduler; batches never overlap because the
//! next tick is not armed until the previous batch has fully joined.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sellersync_core::{CollectionService, JobRegistry};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the collector scheduler
#[derive(Debug, Clone)]
pub struct CollectorSchedulerConfig {
    /// Tick interval between collection batches
    pub interval: Duration,
}

impl Default for CollectorSchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(1_800) } // 30 minutes
    }
}

/// Interval scheduler driving the collection batch
pub struct CollectorScheduler {
    service: Arc<CollectionService>,
    registry: Arc<JobRegistry>,
    config: CollectorSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl CollectorScheduler {
    pub fn new(
        service: Arc<CollectionService>,
        registry: Arc<JobRegistry>,
        config: CollectorSchedulerConfig,
    ) -> Self {
        Self {
            service,
            registry,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler.
    ///
    /// Spawns a background task that runs the collection batch on every
    /// tick.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            interval_secs = self.config.interval.as_secs(),
            jobs = self.registry.len(),
            "Starting collector scheduler"
        );

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::collect_loop(service, registry, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Collector scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully.
    ///
    /// Cancels the background task and awaits completion; in-flight jobs
    /// abort at their next cancellation checkpoint. The join is bounded,
    /// so the scheduler never waits indefinitely on a wedged batch.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping collector scheduler");

        // Cancel background task
        self.cancellation_token.cancel();

        // Await handle with timeout
        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::StopTimeout { seconds: join_timeout.as_secs() })?
                .map_err(|err| SchedulerError::TaskJoinFailed(err.to_string()))?;
        }

        info!("Collector scheduler stopped");
        Ok(())
    }

    /// Check if the scheduler is running.
    ///
    /// A scheduler is considered running if it has an active task handle
    /// that hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Shared cancellation token; threaded into every HTTP call and sleep
    /// inside the batch.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Background collection loop
    async fn collect_loop(
        service: Arc<CollectionService>,
        registry: Arc<JobRegistry>,
        config: CollectorSchedulerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Collection loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    Self::run_batch(&service, &registry, &cancel).await;
                }
            }
        }
    }

    /// Launch every registered job concurrently and wait for the full
    /// batch. A job's failure is logged and does not affect its siblings
    /// or future batches.
    async fn run_batch(
        service: &Arc<CollectionService>,
        registry: &Arc<JobRegistry>,
        cancel: &CancellationToken,
    ) {
        let started = Instant::now();
        info!(jobs = registry.len(), "Starting collection batch");

        let mut handles = Vec::with_capacity(registry.len());
        for job in registry.jobs() {
            let service = Arc::clone(service);
            let job = Arc::clone(job);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move { service.run_job(&job, &cancel).await }));
        }

        let mut failed = 0usize;
        for handle in handles {
            match handle.await {
                Ok(outcome) if outcome.is_err() => {
                    failed += 1;
                    warn!(
                        job = %outcome.job,
                        error = outcome.error.as_deref().unwrap_or(""),
                        "Collection job failed"
                    );
                }
                Ok(outcome) => {
                    debug!(
                        job = %outcome.job,
                        published = outcome.published,
                        elapsed_ms = outcome.elapsed_ms,
                        "Collection job finished"
                    );
                }
                Err(err) => {
                    failed += 1;
                    error!(error = %err, "Collection job panicked");
                }
            }
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            failed,
            "Collection batch completed"
        );
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for CollectorScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            warn!("CollectorScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sellersync_core::collect::ports::{FetchParams, MarketDataSource};
    use sellersync_core::{CollectionJob, Publisher};
    use sellersync_domain::{MarketRecord, Result, SellersyncError};
    use serde_json::json;

    use super::*;
    use crate::publish::memory::InMemoryPublisher;

    /// Source whose per-endpoint behavior is scripted for scheduler tests.
    struct ScriptedSource {
        fail_endpoint: Option<String>,
        fetch_delay: Duration,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        block_until_cancelled: bool,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                fail_endpoint: None,
                fetch_delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                block_until_cancelled: false,
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for ScriptedSource {
        async fn fetch_all(
            &self,
            endpoint: &str,
            _params: &FetchParams,
            cancel: &CancellationToken,
        ) -> Result<Vec<MarketRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);

            let result = async {
                if self.block_until_cancelled {
                    cancel.cancelled().await;
                    return Err(SellersyncError::Internal("cancelled".to_string()));
                }
                if !self.fetch_delay.is_zero() {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(SellersyncError::Internal("cancelled".to_string()));
                        }
                        _ = tokio::time::sleep(self.fetch_delay) => {}
                    }
                }
                if self.fail_endpoint.as_deref() == Some(endpoint) {
                    return Err(SellersyncError::Upstream("scripted failure".to_string()));
                }
                let record = match json!({"endpoint": endpoint}) {
                    serde_json::Value::Object(map) => map,
                    _ => unreachable!(),
                };
                Ok(vec![record])
            }
            .await;

            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }

        async fn fetch_first(
            &self,
            endpoint: &str,
            params: &FetchParams,
            cancel: &CancellationToken,
        ) -> Result<Vec<MarketRecord>> {
            self.fetch_all(endpoint, params, cancel).await
        }
    }

    fn registry(names: &[&str]) -> Arc<JobRegistry> {
        let jobs = names
            .iter()
            .map(|name| {
                CollectionJob::new(*name, *name, format!("test.raw.{name}"), |_| {
                    FetchParams::default()
                })
            })
            .collect();
        Arc::new(JobRegistry::new(jobs))
    }

    fn scheduler(
        source: Arc<ScriptedSource>,
        registry: Arc<JobRegistry>,
        publisher: Arc<InMemoryPublisher>,
        interval: Duration,
    ) -> CollectorScheduler {
        let service = Arc::new(CollectionService::new(
            source as Arc<dyn MarketDataSource>,
            publisher as Arc<dyn Publisher>,
        ));
        CollectorScheduler::new(service, registry, CollectorSchedulerConfig { interval })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scheduler_lifecycle() {
        let source = Arc::new(ScriptedSource::new());
        let publisher = Arc::new(InMemoryPublisher::new());
        let mut scheduler = scheduler(
            source,
            registry(&["orders"]),
            publisher,
            Duration::from_secs(3600),
        );

        // Initially not running
        assert!(!scheduler.is_running());

        // Start succeeds
        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());

        // Stop succeeds
        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_double_start_fails() {
        let source = Arc::new(ScriptedSource::new());
        let publisher = Arc::new(InMemoryPublisher::new());
        let mut scheduler = scheduler(
            source,
            registry(&["orders"]),
            publisher,
            Duration::from_secs(3600),
        );

        scheduler.start().await.unwrap();

        // Second start should fail
        let result = scheduler.start().await;
        assert!(matches!(result, Err(SchedulerError::AlreadyRunning)));

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_failing_job_does_not_stop_its_siblings_or_later_ticks() {
        let source = Arc::new(ScriptedSource {
            fail_endpoint: Some("sales".to_string()),
            ..ScriptedSource::new()
        });
        let publisher = Arc::new(InMemoryPublisher::new());
        let mut scheduler = scheduler(
            source.clone(),
            registry(&["orders", "sales", "stocks"]),
            publisher.clone(),
            Duration::from_millis(25),
        );

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(scheduler.is_running());
        scheduler.stop().await.unwrap();

        // The healthy jobs published on every tick; the failing one never
        // stopped the batch.
        assert!(publisher.count_for("test.raw.orders") >= 2);
        assert!(publisher.count_for("test.raw.stocks") >= 2);
        assert_eq!(publisher.count_for("test.raw.sales"), 0);
        // Every tick still ran all three jobs.
        assert_eq!(source.calls.load(Ordering::SeqCst) % 3, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn batches_never_overlap() {
        // One job that outlives the interval: the next tick must wait for
        // the previous batch to join, so at most one fetch is ever active.
        let source = Arc::new(ScriptedSource {
            fetch_delay: Duration::from_millis(120),
            ..ScriptedSource::new()
        });
        let publisher = Arc::new(InMemoryPublisher::new());
        let mut scheduler = scheduler(
            source.clone(),
            registry(&["orders"]),
            publisher,
            Duration::from_millis(20),
        );

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(450)).await;
        scheduler.stop().await.unwrap();

        assert!(source.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(source.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancellation_aborts_in_flight_jobs() {
        let source = Arc::new(ScriptedSource {
            block_until_cancelled: true,
            ..ScriptedSource::new()
        });
        let publisher = Arc::new(InMemoryPublisher::new());
        let mut scheduler = scheduler(
            source.clone(),
            registry(&["orders"]),
            publisher,
            Duration::from_millis(10),
        );

        scheduler.start().await.unwrap();
        // Let a batch start and block on the cancellation signal.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(source.calls.load(Ordering::SeqCst) >= 1);

        // Stop cancels the shared token; the blocked job must abort fast
        // enough for the bounded join.
        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
    }
}
