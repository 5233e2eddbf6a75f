//! Crawler coordinator - worker pool orchestration
//!
//! The coordinator splits the requested range into one partition per worker and
//! then reacts to three channels until every partition is settled:
//! - pending: partitions handed back by workers (or seeded at start)
//! - results: detail pages on their way to the sink
//! - done: one completion signal per settled partition
//!
//! A failed partition is restarted on a brand-new navigator, and so a brand-new
//! session, after a backoff pause. Its old session is dropped with the worker.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_range, RetrievedPage};
use crate::crawler::navigator::NavigatorFactory;
use crate::crawler::Range;
use crate::output::PageSink;
use crate::state::{PartitionState, SlotStep};
use crate::SugerError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Completion signal for one partition slot
#[derive(Debug)]
enum Completion {
    Finished { slot: usize },
    Abandoned(PartitionState),
}

/// Outcome of a finished crawl
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Pages handed to the sink
    pub pages: u64,

    /// Partitions that fetched their whole range
    pub completed: usize,

    /// Restarts triggered by failed attempts
    pub restarts: u64,

    /// Partitions given up on, with their residual range and last error
    pub abandoned: Vec<PartitionState>,
}

impl CrawlReport {
    /// Returns true when no partition was abandoned
    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<F, S> {
    settings: CrawlerConfig,
    factory: Arc<F>,
    sink: S,
}

impl<F, S> Coordinator<F, S>
where
    F: NavigatorFactory,
    S: PageSink,
{
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `settings` - Worker count, backoff and retry ceiling
    /// * `factory` - Source of fresh navigators, one per attempt
    /// * `sink` - Receives every retrieved page
    pub fn new(settings: CrawlerConfig, factory: Arc<F>, sink: S) -> Self {
        Self {
            settings,
            factory,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Crawls `range` with `settings.workers` independent sessions
    ///
    /// Returns once every partition has either been fetched completely or been
    /// abandoned. Abandoned partitions are listed in the report rather than
    /// returned as an error.
    ///
    /// # Errors
    ///
    /// * `InvalidArgument` - the range cannot be split into that many workers
    /// * `Output` - the sink failed to store a page
    pub async fn run(&mut self, range: Range) -> Result<CrawlReport, SugerError> {
        let parts = range.partition(self.settings.workers)?;
        tracing::info!("Crawling {} with {} partitions", range, parts.len());
        for (slot, part) in parts.iter().enumerate() {
            tracing::debug!("Partition {}: {}", slot, part);
        }

        let capacity = parts.len();
        let (pending_tx, mut pending_rx) = mpsc::channel::<PartitionState>(capacity);
        let (results_tx, mut results_rx) = mpsc::channel::<RetrievedPage>(capacity);
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(capacity);

        for (slot, part) in parts.into_iter().enumerate() {
            pending_tx
                .send(PartitionState::new(slot, part))
                .await
                .map_err(|_| SugerError::ChannelClosed("pending"))?;
        }

        let mut report = CrawlReport::default();
        let mut outstanding = capacity;

        loop {
            tokio::select! {
                Some(mut state) = pending_rx.recv() => {
                    match state.next_step(self.settings.max_retries) {
                        SlotStep::Retire => {
                            tracing::info!("Partition {} finished", state.slot);
                            done_tx
                                .send(Completion::Finished { slot: state.slot })
                                .await
                                .map_err(|_| SugerError::ChannelClosed("done"))?;
                        }
                        SlotStep::Start => {
                            self.spawn_worker(state, Duration::ZERO, &results_tx, &pending_tx);
                        }
                        SlotStep::Backoff => {
                            let delay = self.settings.backoff_delay(state.failures);
                            if let Some(err) = state.take_error() {
                                tracing::warn!(
                                    "Partition {} failed at {}: {}; restarting in {:?}",
                                    state.slot,
                                    state.range,
                                    err,
                                    delay
                                );
                            }
                            report.restarts += 1;
                            self.spawn_worker(state, delay, &results_tx, &pending_tx);
                        }
                        SlotStep::Abandon => {
                            tracing::error!("Giving up on {}", state);
                            done_tx
                                .send(Completion::Abandoned(state))
                                .await
                                .map_err(|_| SugerError::ChannelClosed("done"))?;
                        }
                    }
                }
                Some(page) = results_rx.recv() => {
                    self.store(&page, &mut report)?;
                }
                Some(completion) = done_rx.recv() => {
                    outstanding -= 1;
                    match completion {
                        Completion::Finished { slot } => {
                            tracing::debug!("Partition {} retired", slot);
                            report.completed += 1;
                        }
                        Completion::Abandoned(state) => report.abandoned.push(state),
                    }
                    tracing::info!("One partition settled; {} remaining", outstanding);
                    if outstanding == 0 {
                        break;
                    }
                }
                else => return Err(SugerError::ChannelClosed("coordinator")),
            }
        }

        // Workers send their pages before handing the partition back, so any
        // page still buffered here belongs to a settled partition.
        while let Ok(page) = results_rx.try_recv() {
            self.store(&page, &mut report)?;
        }

        tracing::info!(
            "Crawl finished: {} pages, {} restarts, {} abandoned",
            report.pages,
            report.restarts,
            report.abandoned.len()
        );

        Ok(report)
    }

    fn store(&mut self, page: &RetrievedPage, report: &mut CrawlReport) -> Result<(), SugerError> {
        self.sink.store(page)?;
        report.pages += 1;
        Ok(())
    }

    /// Starts a worker with a fresh navigator after `delay`
    fn spawn_worker(
        &self,
        mut state: PartitionState,
        delay: Duration,
        results: &mpsc::Sender<RetrievedPage>,
        pending: &mpsc::Sender<PartitionState>,
    ) {
        let factory = Arc::clone(&self.factory);
        let results = results.clone();
        let pending = pending.clone();

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            tracing::debug!("Starting worker for {}", state);
            let state = match factory.create() {
                Ok(mut navigator) => fetch_range(&mut navigator, state, &results).await,
                Err(e) => {
                    let start = state.range.start();
                    state.fail(start, e);
                    state
                }
            };

            if pending.send(state).await.is_err() {
                tracing::debug!("Coordinator stopped; dropping partition");
            }
        });
    }
}
