//! Writes retrieved pages into a directory, one file per record

use crate::crawler::RetrievedPage;
use crate::output::traits::{OutputResult, PageSink};
use std::fs;
use std::path::{Path, PathBuf};

/// Sink writing each page body to `<dir>/title-<page>-<row>.html`
///
/// File names depend only on grid coordinates, so a page fetched twice
/// overwrites its earlier copy.
#[derive(Debug, Clone)]
pub struct HtmlDirSink {
    dir: PathBuf,
}

impl HtmlDirSink {
    /// Creates the sink, creating `dir` (and parents) if needed
    pub fn create(dir: impl AsRef<Path>) -> OutputResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a given page is written to
    pub fn path_for(&self, page: &RetrievedPage) -> PathBuf {
        self.dir.join(page.file_name())
    }
}

impl PageSink for HtmlDirSink {
    fn store(&mut self, page: &RetrievedPage) -> OutputResult<()> {
        let path = self.path_for(page);
        fs::write(&path, &page.body)?;
        tracing::debug!("Wrote {} ({} bytes) from {}", path.display(), page.body.len(), page.url);
        Ok(())
    }
}
