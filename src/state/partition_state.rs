//! Orchestrator-side view of one partition of the crawl
use crate::crawler::Range;
use crate::SugerError;
use std::fmt;

/// What the orchestrator does next with a partition it has just received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStep {
    /// Nothing left to fetch; the slot is retired
    Retire,

    /// Untouched or cleanly handed back; start a worker immediately
    Start,

    /// Last attempt failed; start a fresh worker after the backoff pause
    Backoff,

    /// Retry ceiling reached or the error cannot be cured by a new session
    Abandon,
}

/// A partition as it travels between a worker and the orchestrator
#[derive(Debug)]
pub struct PartitionState {
    /// Slot index, stable across restarts; used for logging
    pub slot: usize,

    /// Residual range still to fetch
    pub range: Range,

    /// Error that ended the most recent attempt
    pub error: Option<SugerError>,

    /// Consecutive failed attempts that retrieved nothing
    pub failures: u32,
}

impl PartitionState {
    /// Creates the initial state for a freshly partitioned slot
    pub fn new(slot: usize, range: Range) -> Self {
        Self {
            slot,
            range,
            error: None,
            failures: 0,
        }
    }

    /// Records a failed attempt that began at `attempt_start`
    ///
    /// An attempt that fetched at least one position resets the failure streak.
    pub fn fail(&mut self, attempt_start: u32, error: SugerError) {
        if self.range.start() > attempt_start {
            self.failures = 1;
        } else {
            self.failures = self.failures.saturating_add(1);
        }
        self.error = Some(error);
    }

    /// Clears the error before the state is handed to a new worker
    pub fn take_error(&mut self) -> Option<SugerError> {
        self.error.take()
    }

    /// Decides the next step for this slot
    ///
    /// `max_retries` of `None` means a failing slot is retried forever.
    pub fn next_step(&self, max_retries: Option<u32>) -> SlotStep {
        if self.range.is_exhausted() {
            return SlotStep::Retire;
        }

        match &self.error {
            None => SlotStep::Start,
            Some(err) if !err.is_retryable() => SlotStep::Abandon,
            Some(_) => match max_retries {
                Some(limit) if self.failures > limit => SlotStep::Abandon,
                _ => SlotStep::Backoff,
            },
        }
    }
}

impl fmt::Display for PartitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} {}", self.slot, self.range)?;
        if let Some(err) = &self.error {
            write!(f, " (failure {}: {})", self.failures, err)?;
        }
        Ok(())
    }
}
