//! Output module for crawl and scrape results
//!
//! This module handles:
//! - Storing retrieved detail pages as they stream out of the crawler
//! - Exporting scraped titles as JSON

mod html_dir;
mod json;
mod traits;

pub use html_dir::HtmlDirSink;
pub use json::{write_titles_json, JSON_FILE_NAME};
pub use traits::{OutputError, OutputResult, PageSink};
