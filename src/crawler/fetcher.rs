//! Record fetch loop
//!
//! Drives one navigator across one partition:
//! - initialize the session and submit the search
//! - seek the grid to the partition's first page through the pager window
//! - open each row in turn, paging forward at page boundaries
//! - emit one [`RetrievedPage`] per logical position
//!
//! On any failure the partition comes back with its *current* residual range,
//! so a restart resumes at the position that failed and never repeats one that
//! was already emitted.

use crate::crawler::navigator::{seek_path, Navigator, RowResponse};
use crate::crawler::Range;
use crate::scrape::detail_title;
use crate::state::PartitionState;
use crate::{ProtocolError, SugerError};
use tokio::sync::mpsc;

/// One detail page fetched from the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedPage {
    /// Final URL the detail page was served from
    pub url: String,

    /// Raw page body
    pub body: Vec<u8>,

    /// Grid page the record was listed on
    pub page: u32,

    /// Row of the record on that page
    pub row: u32,
}

impl RetrievedPage {
    /// Deterministic file name derived from the grid coordinates
    pub fn file_name(&self) -> String {
        format!("title-{}-{}.html", self.page, self.row)
    }
}

/// Fetches every position of `state.range`, streaming pages into `results`
///
/// Returns the partition with its range advanced past everything emitted. If
/// the attempt failed, the error is recorded on the returned state.
pub async fn fetch_range<N>(
    navigator: &mut N,
    mut state: PartitionState,
    results: &mpsc::Sender<RetrievedPage>,
) -> PartitionState
where
    N: Navigator + ?Sized,
{
    let attempt_start = state.range.start();

    if let Err(e) = run(navigator, &mut state.range, results).await {
        tracing::debug!("Partition {} stopped at {}: {}", state.slot, state.range, e);
        state.fail(attempt_start, e);
    }

    state
}

async fn run<N>(
    navigator: &mut N,
    range: &mut Range,
    results: &mpsc::Sender<RetrievedPage>,
) -> Result<(), SugerError>
where
    N: Navigator + ?Sized,
{
    if range.is_exhausted() {
        return Ok(());
    }

    navigator.initialize().await?;
    navigator.submit_search().await?;

    for page in seek_path(range.page()) {
        navigator.advance_to_page(page).await?;
    }

    loop {
        let page = range.page();
        let row = range.row();

        let response = navigator.open_row(row).await?;
        validate(&response)?;

        results
            .send(RetrievedPage {
                url: response.url,
                body: response.body,
                page,
                row,
            })
            .await
            .map_err(|_| SugerError::ChannelClosed("results"))?;

        *range = range.advance();
        if range.is_exhausted() {
            return Ok(());
        }

        if range.page() != page {
            navigator.advance_to_page(range.page()).await?;
        }
    }
}

/// Rejects detail pages without a title; those come back from expired sessions
fn validate(response: &RowResponse) -> Result<(), ProtocolError> {
    let html = String::from_utf8_lossy(&response.body);
    match detail_title(&html) {
        Some(_) => Ok(()),
        None => Err(ProtocolError::EmptyTitle {
            url: response.url.clone(),
        }),
    }
}
