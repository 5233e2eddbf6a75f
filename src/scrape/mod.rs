//! Scraping of retrieved detail pages into structured titles

mod detail;
mod title;

pub use detail::{detail_title, parse_detail_page};
pub use title::{Rating, Title, MISSING_RATING, RATING_ORDER};

use crate::SugerError;
use std::fs;
use std::path::Path;
use url::Url;

/// Parses every file in `html_dir`, in file name order
///
/// # Errors
///
/// * `Io` - the directory or a file could not be read
/// * `HtmlParse` - a file is not a well-formed detail page
pub fn scrape_dir(html_dir: &Path, base_url: &Url) -> Result<Vec<Title>, SugerError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(html_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut titles = Vec::with_capacity(paths.len());
    for path in &paths {
        let html = fs::read(path)?;
        let title = parse_detail_page(&html, base_url).map_err(|message| SugerError::HtmlParse {
            path: path.display().to_string(),
            message,
        })?;
        tracing::trace!("Scraped {:?} from {}", title.name, path.display());
        titles.push(title);
    }

    tracing::info!("Scraped {} titles from {}", titles.len(), html_dir.display());
    Ok(titles)
}
