//! Output sink trait and error types

use crate::crawler::RetrievedPage;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for retrieved detail pages
///
/// The coordinator owns its sink and calls it from a single task, so
/// implementations need no internal locking.
pub trait PageSink {
    /// Stores one retrieved page
    fn store(&mut self, page: &RetrievedPage) -> OutputResult<()>;
}

/// Keeps pages in memory
impl PageSink for Vec<RetrievedPage> {
    fn store(&mut self, page: &RetrievedPage) -> OutputResult<()> {
        self.push(page.clone());
        Ok(())
    }
}
