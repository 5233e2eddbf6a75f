//! Crawler module for the postback-driven search grid
//!
//! This module contains the core crawling logic, including:
//! - Logical ranges and their page/row coordinates
//! - Per-worker sessions carrying cookies and form tokens
//! - The navigator that speaks the postback protocol
//! - The per-partition record fetch loop
//! - Worker pool coordination with restart on failure

mod coordinator;
mod fetcher;
mod navigator;
mod range;
mod session;

#[cfg(test)]
mod testing;

pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{fetch_range, RetrievedPage};
pub use navigator::{
    is_reachable, seek_path, HttpNavigator, HttpNavigatorFactory, Navigator, NavigatorFactory,
    RowResponse, PAGE_WINDOW,
};
pub use range::{page_of, row_of, Range, PAGE_SIZE};
pub use session::{build_http_client, Session, TokenSet, TOKEN_FIELDS};

use crate::config::Config;
use crate::output::HtmlDirSink;
use crate::SugerError;
use std::sync::Arc;

/// Runs a complete crawl of `range` against the live site
///
/// Pages are written into the configured HTML directory as they arrive.
///
/// # Example
///
/// ```no_run
/// use suger::config::Config;
/// use suger::crawler::{crawl, Range};
///
/// # async fn example() -> Result<(), suger::SugerError> {
/// let report = crawl(Config::default(), Range::new(1, 25)?).await?;
/// println!("{} pages", report.pages);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, range: Range) -> Result<CrawlReport, SugerError> {
    let sink = HtmlDirSink::create(&config.output.html_dir)?;
    let settings = config.crawler.clone();
    let factory = Arc::new(HttpNavigatorFactory::new(Arc::new(config)));

    let mut coordinator = Coordinator::new(settings, factory, sink);
    coordinator.run(range).await
}
