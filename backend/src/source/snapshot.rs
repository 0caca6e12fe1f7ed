//! Local snapshot directory source.
//!
//! ```text
//! snapshots/
//! ├── workbook.json          # optional, wins over the CSV files
//! ├── Engineering.csv        # one tab per CSV, title = file stem
//! ├── Key Wins.csv
//! └── <source_id>/           # used instead of the root when present
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::TabularSource;
use crate::error::{SourceError, SourceResult};
use crate::models::Workbook;
use crate::parser::{parse_tab_bytes, parse_workbook_json};

/// File that holds a complete workbook snapshot.
pub const WORKBOOK_FILE: &str = "workbook.json";

/// Source id used for a snapshot directory when no sheet id is configured.
pub const DEFAULT_SNAPSHOT_ID: &str = "local";

#[derive(Debug, Clone)]
pub struct SnapshotSource {
    root: PathBuf,
}

impl SnapshotSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<source_id>` when that directory exists, else `<root>`.
    pub fn directory_for(&self, source_id: &str) -> PathBuf {
        let id = source_id.trim();
        if !id.is_empty() && !id.contains(['/', '\\']) && id != ".." {
            let nested = self.root.join(id);
            if nested.is_dir() {
                return nested;
            }
        }
        self.root.clone()
    }
}

async fn load_csv_tabs(dir: &Path) -> SourceResult<Workbook> {
    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut tabs = Vec::with_capacity(paths.len());
    for path in paths {
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes = tokio::fs::read(&path).await?;
        let parsed = parse_tab_bytes(&title, &bytes)?;
        tracing::debug!(
            tab = %title,
            encoding = %parsed.encoding,
            delimiter = ?parsed.delimiter,
            rows = parsed.tab.rows.len(),
            "loaded snapshot tab"
        );
        tabs.push(parsed.tab);
    }
    Ok(Workbook::new(tabs))
}

#[async_trait]
impl TabularSource for SnapshotSource {
    async fn fetch_workbook(&self, source_id: &str) -> SourceResult<Workbook> {
        if !self.root.is_dir() {
            return Err(SourceError::Unavailable(format!(
                "snapshot directory {} does not exist",
                self.root.display()
            )));
        }

        let dir = self.directory_for(source_id);
        let workbook_file = dir.join(WORKBOOK_FILE);
        if workbook_file.is_file() {
            let content = tokio::fs::read_to_string(&workbook_file).await?;
            return parse_workbook_json(&content);
        }

        load_csv_tabs(&dir).await
    }

    fn describe(&self) -> String {
        format!("snapshot directory {}", self.root.display())
    }
}
