//! JSON export of scraped titles

use crate::output::traits::OutputResult;
use crate::scrape::Title;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the export inside the output directory
pub const JSON_FILE_NAME: &str = "out.json";

/// Serialized form of a title, with its highest rating resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TitleRecord<'a> {
    #[serde(flatten)]
    title: &'a Title,
    max_rating: &'a str,
}

/// Writes `titles` as a pretty-printed JSON array to `<out_dir>/out.json`
///
/// Creates `out_dir` if it does not exist and returns the path written.
pub fn write_titles_json(titles: &[Title], out_dir: &Path) -> OutputResult<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(JSON_FILE_NAME);

    let records: Vec<TitleRecord<'_>> = titles
        .iter()
        .map(|title| TitleRecord {
            title,
            max_rating: title.max_rating_or_fallback(),
        })
        .collect();

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.flush()?;

    tracing::info!("Wrote {} titles to {}", titles.len(), path.display());
    Ok(path)
}
