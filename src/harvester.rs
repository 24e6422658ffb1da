//! Run orchestration: partition, fan out workers, monitor, fan in
//!
//! One task per slice runs [`process_slice`] over a shared [`RunContext`].
//! A monitor task reports the shared counter. Once every worker has finished
//! the slice results are merged by slice index.
//!
//! A fatal fetch error in any worker cancels the run token, aborts the other
//! workers and is returned as is. Nothing from the other slices is salvaged.

use crate::aggregate::{AggregateResult, aggregate};
use crate::attribution::AttributionStore;
use crate::config::HarvestConfig;
use crate::error::{Error, Result};
use crate::fetcher::{HttpFetcher, PageSource};
use crate::partition::partition;
use crate::pipeline::{RunContext, process_slice};
use crate::progress::{PROGRESS_INTERVAL, ProgressSink, SilentProgress, spawn_progress_monitor};
use futures::{FutureExt, StreamExt, stream::FuturesUnordered};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Entry point of the library: one harvest over a code range
pub struct Harvester {
    config: HarvestConfig,
    source: Arc<dyn PageSource>,
    attribution: AttributionStore,
    progress: Box<dyn ProgressSink>,
    progress_interval: Duration,
    cancel: CancellationToken,
}

impl Harvester {
    /// Harvester fetching from the portal over HTTP
    pub fn new(config: HarvestConfig, attribution: AttributionStore) -> Result<Self> {
        let source = Arc::new(HttpFetcher::new(&config)?);
        Self::with_source(config, source, attribution)
    }

    /// Harvester reading pages from any [`PageSource`]
    pub fn with_source(
        config: HarvestConfig,
        source: Arc<dyn PageSource>,
        attribution: AttributionStore,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            attribution,
            progress: Box::new(SilentProgress),
            progress_interval: PROGRESS_INTERVAL,
            cancel: CancellationToken::new(),
        })
    }

    /// Report progress to `sink` every `interval`
    #[must_use]
    pub fn with_progress(mut self, sink: Box<dyn ProgressSink>, interval: Duration) -> Self {
        self.progress = sink;
        self.progress_interval = interval;
        self
    }

    /// Token that stops the run from outside (e.g. on Ctrl-C)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the harvest to completion
    ///
    /// # Errors
    /// Returns the first fatal error of any worker, or [`Error::Cancelled`] if
    /// the run was cancelled from outside.
    pub async fn run(self) -> Result<AggregateResult> {
        let Self {
            config,
            source,
            attribution,
            progress,
            progress_interval,
            cancel,
        } = self;

        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| Error::config(format!("invalid base URL: {}", e), "base_url"))?;
        let slices = partition(config.first_code, config.last_code, config.workers)?;
        let total = config.total_codes() as usize;

        let mut context = RunContext::new(source, attribution, base_url)?;
        context.cancel = cancel;
        let ctx = Arc::new(context);

        tracing::info!(
            first = config.first_code,
            last = config.last_code,
            workers = config.workers,
            attributions = ctx.attribution.len(),
            "Starting harvest"
        );

        let monitor = spawn_progress_monitor(
            ctx.processed.clone(),
            total,
            progress,
            ctx.cancel.clone(),
            progress_interval,
        );

        let handles: Vec<_> = slices
            .into_iter()
            .map(|slice| (slice.index, tokio::spawn(process_slice(ctx.clone(), slice))))
            .collect();
        let abort_handles: Vec<_> = handles.iter().map(|(_, h)| h.abort_handle()).collect();

        let mut pending: FuturesUnordered<_> = handles
            .into_iter()
            .map(|(index, handle)| handle.map(move |joined| (index, joined)))
            .collect();

        let mut results = Vec::with_capacity(abort_handles.len());
        let mut fatal = None;
        let mut cancelled = false;
        let mut aborted = false;

        loop {
            tokio::select! {
                biased;
                next = pending.next() => {
                    let Some((index, joined)) = next else { break };
                    match joined {
                        Ok(Ok(slice)) => results.push((index, slice)),
                        // Another worker's fatal error is on its way, keep draining
                        Ok(Err(Error::Cancelled)) => cancelled = true,
                        Ok(Err(e)) => {
                            fatal = Some(e);
                            break;
                        }
                        Err(join_error) if join_error.is_cancelled() => cancelled = true,
                        Err(join_error) => {
                            fatal = Some(Error::WorkerPanicked {
                                slice: index,
                                message: join_error.to_string(),
                            });
                            break;
                        }
                    }
                }
                // Workers may be waiting between retries; stop them right away
                _ = ctx.cancel.cancelled(), if !aborted => {
                    aborted = true;
                    for handle in &abort_handles {
                        handle.abort();
                    }
                }
            }
        }

        if let Some(e) = fatal {
            ctx.cancel.cancel();
            for handle in &abort_handles {
                handle.abort();
            }
            let _ = monitor.await;
            tracing::error!(error = %e, "Harvest aborted");
            return Err(e);
        }
        if cancelled || ctx.cancel.is_cancelled() {
            let _ = monitor.await;
            tracing::warn!("Harvest cancelled before completion");
            return Err(Error::Cancelled);
        }

        if let Err(e) = monitor.await {
            tracing::warn!(error = %e, "Progress monitor did not shut down cleanly");
        }

        let result = aggregate(results);
        tracing::info!(
            zones = result.zones,
            latest = result.latest.len(),
            history = result.history.len(),
            skipped = result.log.len(),
            "Harvest finished"
        );
        Ok(result)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_source_validates_config() {
        struct NoPages;

        #[async_trait::async_trait]
        impl PageSource for NoPages {
            async fn fetch(&self, url: &str) -> Result<String> {
                Err(Error::Http {
                    status: 404,
                    url: url.to_string(),
                })
            }
        }

        let config = HarvestConfig {
            workers: 0,
            ..Default::default()
        };
        let result = Harvester::with_source(config, Arc::new(NoPages), AttributionStore::empty("x"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
