//! Filesystem output handler

use crate::config::{OutputConfig, OutputLayout};
use crate::output::layout::relative_path;
use crate::output::markdown::format_document;
use crate::output::traits::{
    CrawlSummary, ExtractionResult, OutputError, OutputHandler, OutputResult,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Name of the aggregate summary artifact inside the output directory
pub const SUMMARY_FILE: &str = "crawl_summary.json";

/// Writes one markdown document per page plus a JSON run summary
///
/// Every write goes to a temporary sibling first and is renamed into place,
/// so an interrupted run never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct FileOutput {
    directory: PathBuf,
    layout: OutputLayout,
    include_metadata: bool,
}

impl FileOutput {
    pub fn new(
        directory: impl Into<PathBuf>,
        layout: OutputLayout,
        include_metadata: bool,
    ) -> Self {
        Self {
            directory: directory.into(),
            layout,
            include_metadata,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.directory.clone(), config.layout, config.include_metadata)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.directory.join(SUMMARY_FILE)
    }
}

#[async_trait]
impl OutputHandler for FileOutput {
    fn directory(&self) -> &Path {
        &self.directory
    }

    fn projected_path(&self, url: &str) -> PathBuf {
        self.directory.join(relative_path(self.layout, url))
    }

    async fn prepare(&self) -> OutputResult<()> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| OutputError::Write {
                path: self.directory.clone(),
                source,
            })
    }

    async fn persist(&self, result: &ExtractionResult) -> OutputResult<PathBuf> {
        let path = self.projected_path(&result.url);
        let document = format_document(result, self.include_metadata);
        write_atomic(&path, document.as_bytes()).await?;
        tracing::debug!("Wrote {} ({} bytes)", path.display(), document.len());
        Ok(path)
    }

    async fn write_summary(&self, summary: &CrawlSummary) -> OutputResult<PathBuf> {
        let path = self.summary_path();
        let json = serde_json::to_string_pretty(summary)?;
        write_atomic(&path, json.as_bytes()).await?;
        Ok(path)
    }
}

/// Writes `contents` to a temporary sibling of `path`, then renames it into place
///
/// The temporary name carries a random suffix so concurrent writers never
/// share one.
async fn write_atomic(path: &Path, contents: &[u8]) -> OutputResult<()> {
    let wrap = |source: std::io::Error| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(format!(".{:016x}.tmp", rand::random::<u64>()));
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(wrap)?;
    if let Err(source) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(wrap(source));
    }

    Ok(())
}
