//! Batch orchestration of route validations.
//!
//! The runner partitions the request table into fixed-size batches and, per
//! batch, fans the rows out across a bounded worker pool. Batches never
//! overlap; a cooldown separates them to stay friendly to upstream rate
//! limits. Results are collected in completion order, so the outcome table
//! carries no particular row order. One route's failure never aborts the
//! batch or the run — it becomes one failed row.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

use crate::http::HttpClient;
use crate::options::ApiOptions;
use crate::outcome::{BatchStats, RouteOutcome};
use crate::request::RouteRequest;
use crate::retry::RetrySettings;
use crate::validator::{RouteValidator, DEFAULT_TIMEOUT};

/// Configuration for a validation run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Number of routes per batch
    pub batch_size: usize,

    /// Maximum number of concurrently in-flight validations within a batch
    pub max_workers: usize,

    /// Sleep after each completed route before the next completion is
    /// processed. A loose throttle on result processing, not a strict rate
    /// limit — up to `max_workers` requests stay in flight regardless.
    pub request_delay: Duration,

    /// Cooldown between successive batches (not after the last)
    pub batch_pause: Duration,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retry behavior for transient failures
    pub retry: RetrySettings,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            max_workers: 7,
            request_delay: Duration::from_millis(100),
            batch_pause: Duration::from_secs(2),
            timeout: DEFAULT_TIMEOUT,
            retry: RetrySettings::default(),
        }
    }
}

/// A progress event, emitted after each completed route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// 1-based index of the batch being processed
    pub batch: usize,
    pub total_batches: usize,
    /// Routes completed so far across the whole run
    pub completed: usize,
    /// Total routes in the run
    pub total: usize,
}

/// Runs validation batches against the routing API.
pub struct BatchRunner<H: HttpClient + 'static> {
    validator: RouteValidator<H>,
    config: RunnerConfig,
    updates_tx: broadcast::Sender<ProgressUpdate>,
}

impl<H: HttpClient + 'static> BatchRunner<H> {
    /// Create a runner for one profile against one API configuration.
    pub fn new(
        http: H,
        options: Arc<ApiOptions>,
        profile: impl Into<String>,
        config: RunnerConfig,
    ) -> Self {
        let (updates_tx, _) = broadcast::channel(1024);
        let validator = RouteValidator::new(
            http,
            options,
            profile,
            config.retry.clone(),
            config.timeout,
        );

        Self {
            validator,
            config,
            updates_tx,
        }
    }

    /// Subscribe to progress updates.
    ///
    /// Returns a stream emitting one `ProgressUpdate` per completed route.
    /// The core emits nothing else — rendering progress is entirely the
    /// subscriber's business. A receiver that falls behind the channel
    /// buffer misses updates rather than slowing the run down.
    pub fn subscribe(&self) -> Pin<Box<dyn Stream<Item = ProgressUpdate> + Send>> {
        let rx = self.updates_tx.subscribe();
        Box::pin(BroadcastStream::new(rx).filter_map(|result| result.ok()))
    }

    /// Run the whole request table, returning the outcome table and its
    /// aggregate statistics.
    ///
    /// The output has exactly one row per input row, in completion order.
    /// There is no cancellation once a batch has started; the natural unit
    /// of interruption is the batch boundary.
    #[tracing::instrument(skip(self, requests), fields(total = requests.len()))]
    pub async fn run(&self, requests: Vec<RouteRequest>) -> (Vec<RouteOutcome>, BatchStats) {
        let total = requests.len();
        let batch_size = self.config.batch_size.max(1);
        let total_batches = total.div_ceil(batch_size);

        info!(
            total,
            batch_size,
            max_workers = self.config.max_workers,
            "Starting validation run"
        );

        let mut batches = Vec::with_capacity(total_batches);
        let mut iter = requests.into_iter();
        loop {
            let batch: Vec<RouteRequest> = iter.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            batches.push(batch);
        }

        let mut outcomes: Vec<RouteOutcome> = Vec::with_capacity(total);
        for (index, batch) in batches.into_iter().enumerate() {
            let completed_before = outcomes.len();
            let batch_outcomes = self
                .run_batch(batch, index + 1, total_batches, completed_before, total)
                .await;
            outcomes.extend(batch_outcomes);

            if index + 1 < total_batches {
                debug!(
                    pause_ms = self.config.batch_pause.as_millis() as u64,
                    "Cooling down between batches"
                );
                tokio::time::sleep(self.config.batch_pause).await;
            }
        }

        let stats = BatchStats::from_outcomes(&outcomes);
        info!(
            successful = stats.successful_routes,
            failed = stats.failed_routes,
            total_retries = stats.total_retries,
            "Validation run complete"
        );
        (outcomes, stats)
    }

    /// Process one batch across the worker pool, collecting outcomes in
    /// completion order.
    async fn run_batch(
        &self,
        batch: Vec<RouteRequest>,
        batch_index: usize,
        total_batches: usize,
        completed_before: usize,
        total: usize,
    ) -> Vec<RouteOutcome> {
        info!(
            batch = batch_index,
            total_batches,
            routes = batch.len(),
            "Processing batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut join_set = JoinSet::new();

        for request in batch {
            let validator = self.validator.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                // Held for the duration of the validation; bounds the pool.
                // The semaphore is never closed while the batch runs.
                let _permit = semaphore.acquire_owned().await.ok();
                validator.validate(request).await
            });
        }

        let mut outcomes = Vec::new();
        let mut success_count = 0usize;
        let mut error_count = 0usize;
        let mut retry_total = 0u64;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    if outcome.status.is_success() {
                        success_count += 1;
                    } else {
                        error_count += 1;
                    }
                    retry_total += u64::from(outcome.retries);
                    outcomes.push(outcome);

                    let _ = self.updates_tx.send(ProgressUpdate {
                        batch: batch_index,
                        total_batches,
                        completed: completed_before + outcomes.len(),
                        total,
                    });

                    tokio::time::sleep(self.config.request_delay).await;
                }
                Err(e) => {
                    error!(error = %e, "Validation task panicked");
                }
            }
        }

        info!(
            batch = batch_index,
            success = success_count,
            errors = error_count,
            retries = retry_total,
            "Batch complete"
        );
        outcomes
    }
}
