//! Domain models for the funnel dashboard.
//!
//! Input side (read-only snapshot of the spreadsheet):
//!
//! - [`Workbook`] - ordered tabs
//! - [`Tab`] - a named sheet, ordered rows of [`Cell`]s
//!
//! Output side (built fresh per request):
//!
//! - [`Role`] - one hiring funnel with its [`FunnelStage`]s and derived [`ConversionRate`]s
//! - [`KeyWin`] - flat key-win record
//! - [`DailyUpdate`] - flat daily TA update record

use serde::{Deserialize, Serialize};

use crate::transform::stages::{conversion_rates, health_score};

// =============================================================================
// Tabular input
// =============================================================================

/// One spreadsheet cell, carrying its display-formatted value if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell {
    pub value: Option<String>,
}

impl Cell {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: Some(value.into()) }
    }

    pub fn empty() -> Self {
        Self { value: None }
    }

    /// Display value, if the cell carries one.
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// An ordered sequence of cells.
pub type Row = Vec<Cell>;

/// A named sheet. Row 0 is conventionally the header row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub title: String,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Tab {
    pub fn new(title: impl Into<String>, rows: Vec<Row>) -> Self {
        Self { title: title.into(), rows }
    }

    /// Build a tab from plain strings; handy for fixtures and CSV loading.
    pub fn from_strings<R, C>(title: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Cell::new).collect())
            .collect();
        Self::new(title, rows)
    }

    /// Header row as trimmed strings (empty when the tab has no rows).
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| {
                row.iter()
                    .map(|c| c.text().unwrap_or("").trim().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rows after the header row.
    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// A full snapshot of the tabular source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

impl Workbook {
    pub fn new(tabs: Vec<Tab>) -> Self {
        Self { tabs }
    }

    pub fn titles(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.title.as_str()).collect()
    }
}

// =============================================================================
// Funnel
// =============================================================================

/// One step of a hiring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage_name: String,
    pub candidate_count: u32,
    pub last_updated: String,
}

impl FunnelStage {
    pub fn new(stage_name: impl Into<String>, candidate_count: u32, last_updated: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            candidate_count,
            last_updated: last_updated.into(),
        }
    }
}

/// Share of candidates advancing from one stage to the next, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRate {
    pub from_stage: String,
    pub to_stage: String,
    pub rate: f64,
    pub is_low: bool,
}

/// A hiring funnel for one role.
///
/// `conversion_rates` and `funnel_health_score` are always derived from
/// `stages`; every mutation goes through methods that recompute them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    name: String,
    stages: Vec<FunnelStage>,
    remarks: String,
    last_updated: String,
    is_active: bool,
    funnel_health_score: f64,
    conversion_rates: Vec<ConversionRate>,
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        stages: Vec<FunnelStage>,
        remarks: impl Into<String>,
        last_updated: impl Into<String>,
        is_active: bool,
    ) -> Self {
        let mut role = Self {
            name: name.into(),
            stages,
            remarks: remarks.into(),
            last_updated: last_updated.into(),
            is_active,
            funnel_health_score: 0.0,
            conversion_rates: Vec::new(),
        };
        role.recompute();
        role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[FunnelStage] {
        &self.stages
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn last_updated(&self) -> &str {
        &self.last_updated
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn funnel_health_score(&self) -> f64 {
        self.funnel_health_score
    }

    pub fn conversion_rates(&self) -> &[ConversionRate] {
        &self.conversion_rates
    }

    /// Keep only the stages matching `keep`, then recompute derived fields.
    pub fn retain_stages<F>(&mut self, keep: F)
    where
        F: FnMut(&FunnelStage) -> bool,
    {
        self.stages.retain(keep);
        self.recompute();
    }

    /// Drop the stage called `stage_name` (case-insensitive) if its count is zero.
    pub fn drop_empty_stage(&mut self, stage_name: &str) {
        self.retain_stages(|s| {
            !(s.candidate_count == 0 && s.stage_name.eq_ignore_ascii_case(stage_name))
        });
    }

    fn recompute(&mut self) {
        self.conversion_rates = conversion_rates(&self.stages);
        self.funnel_health_score = health_score(&self.stages);
    }
}

// =============================================================================
// Flat records
// =============================================================================

/// A notable hire or milestone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyWin {
    pub date: String,
    pub department: String,
    pub position: String,
    pub remarks: String,
}

/// One TA's daily activity line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUpdate {
    pub date: String,
    pub ta_name: String,
    pub department: String,
    pub country: String,
    pub role: String,
    pub number_of_openings: u32,
    pub interviews_scheduled: u32,
    pub interviews_completed: u32,
    pub cancelled_no_show: u32,
    pub offers_made: u32,
    pub pending_interview_feedback: u32,
    pub upcoming_hm_interviews: u32,
    pub remarks: String,
}
