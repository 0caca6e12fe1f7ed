//! Tabular source boundary.
//!
//! The transformer only ever sees a [`Workbook`]. Where it comes from is
//! behind [`TabularSource`]:
//!
//! ```text
//! ┌──────────────────┐
//! │ SheetsApiSource  │──┐
//! ├──────────────────┤  │   fetch_workbook(id)   ┌──────────┐
//! │ SnapshotSource   │──┼───────────────────────▶│ Workbook │
//! ├──────────────────┤  │                        └──────────┘
//! │ StaticSource     │──┘
//! └──────────────────┘
//! ```
//!
//! A missing source is a normal state, modelled as `Option<Arc<dyn TabularSource>>`
//! by the caller rather than a failing implementation.

pub mod sheets;
pub mod snapshot;

use async_trait::async_trait;

use crate::error::SourceResult;
use crate::models::Workbook;

pub use sheets::{SheetsApiSource, SheetsAuth, DEFAULT_SHEETS_BASE_URL};
pub use snapshot::{SnapshotSource, DEFAULT_SNAPSHOT_ID};

/// Something that can produce a read-only snapshot of the spreadsheet.
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Fetch every tab of the workbook identified by `source_id`.
    async fn fetch_workbook(&self, source_id: &str) -> SourceResult<Workbook>;

    /// Short human-readable description for logs and the health endpoint.
    fn describe(&self) -> String;
}

/// An in-memory workbook, returned for any source id.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    workbook: Workbook,
}

impl StaticSource {
    pub fn new(workbook: Workbook) -> Self {
        Self { workbook }
    }
}

#[async_trait]
impl TabularSource for StaticSource {
    async fn fetch_workbook(&self, _source_id: &str) -> SourceResult<Workbook> {
        Ok(self.workbook.clone())
    }

    fn describe(&self) -> String {
        format!("static workbook ({} tabs)", self.workbook.tabs.len())
    }
}
