//! One extraction routine shared by every mode.
//!
//! A mode is an [`ExtractionPlan`]: which columns to resolve, which fields
//! decide whether a row is blank, and how rows are grouped. Post-filters
//! (date window, equality filters) run over the resulting [`Record`]s.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

use super::dates::parse_any;
use super::decode::{cell_count, cell_text};
use super::headers::{resolve, ColumnMap, FieldSpec};
use crate::models::{Row, Tab};

/// How data rows are collapsed after decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Grouping {
    /// Keep every row, in sheet order.
    #[default]
    None,
    /// One row per key: the one with the latest timestamp (later row wins ties).
    LatestPerKey { key: Vec<String>, timestamp: String },
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionPlan {
    pub spec: FieldSpec,
    /// A row whose key fields are all empty is skipped. With no key fields,
    /// only fully blank rows are skipped.
    pub key_fields: Vec<String>,
    pub grouping: Grouping,
}

impl ExtractionPlan {
    pub fn new(spec: FieldSpec) -> Self {
        Self { spec, ..Self::default() }
    }

    pub fn key_fields(mut self, fields: &[&str]) -> Self {
        self.key_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn latest_per_key(mut self, key: &[&str], timestamp: &str) -> Self {
        self.grouping = Grouping::LatestPerKey {
            key: key.iter().map(|f| f.to_string()).collect(),
            timestamp: timestamp.to_string(),
        };
        self
    }
}

/// Rows selected from a tab together with their resolved columns.
#[derive(Debug, Clone)]
pub struct Extraction<'a> {
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    rows: Vec<&'a Row>,
}

impl<'a> Extraction<'a> {
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(move |row| Record { row: *row, columns: &self.columns })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A decoded view over one row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'e> {
    row: &'e Row,
    columns: &'e ColumnMap,
}

impl<'e> Record<'e> {
    pub fn text(&self, field: &str) -> &'e str {
        cell_text(self.row, self.columns.get(field))
    }

    pub fn string(&self, field: &str) -> String {
        self.text(field).to_string()
    }

    pub fn count(&self, field: &str) -> u32 {
        cell_count(self.row, self.columns.get(field))
    }

    pub fn text_at(&self, index: usize) -> &'e str {
        cell_text(self.row, Some(index))
    }

    pub fn count_at(&self, index: usize) -> u32 {
        cell_count(self.row, Some(index))
    }

    pub fn has(&self, field: &str) -> bool {
        self.columns.has(field)
    }
}

/// Run `plan` over `tab` (row 0 is the header row).
pub fn extract<'a>(tab: &'a Tab, plan: &ExtractionPlan) -> Extraction<'a> {
    let headers = tab.headers();
    let columns = resolve(&headers, &plan.spec);

    let kept: Vec<&Row> = tab
        .data_rows()
        .iter()
        .filter(|row| !is_blank(row, &columns, &plan.key_fields))
        .collect();

    let rows = match &plan.grouping {
        Grouping::None => kept,
        Grouping::LatestPerKey { key, timestamp } => latest_per_key(kept, &columns, key, timestamp),
    };

    Extraction { headers, columns, rows }
}

fn is_blank(row: &Row, columns: &ColumnMap, key_fields: &[String]) -> bool {
    if key_fields.is_empty() {
        return row.iter().all(|c| c.text().map_or(true, |t| t.trim().is_empty()));
    }
    key_fields
        .iter()
        .all(|field| cell_text(row, columns.get(field)).is_empty())
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

fn latest_per_key<'a>(
    rows: Vec<&'a Row>,
    columns: &ColumnMap,
    key: &[String],
    timestamp: &str,
) -> Vec<&'a Row> {
    let mut slots: Vec<(NaiveDateTime, &'a Row)> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let group = key
            .iter()
            .map(|field| cell_text(row, columns.get(field)).to_lowercase())
            .collect::<Vec<_>>()
            .join("\u{1f}");
        let ts = parse_any(cell_text(row, columns.get(timestamp))).unwrap_or_else(epoch);

        match by_key.get(&group) {
            Some(&slot) => {
                if ts >= slots[slot].0 {
                    slots[slot] = (ts, row);
                }
            }
            None => {
                by_key.insert(group, slots.len());
                slots.push((ts, row));
            }
        }
    }

    slots.into_iter().map(|(_, row)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::headers::Matcher;

    fn spec() -> FieldSpec {
        FieldSpec::new()
            .field("timestamp", [Matcher::contains("timestamp")])
            .field("department", [Matcher::contains("department")])
            .field("role", [Matcher::contains("role")])
            .field("applicants", [Matcher::contains("applicants")])
    }

    fn tab() -> Tab {
        Tab::from_strings(
            "Form Responses 1",
            vec![
                vec!["Timestamp", "Department", "Role", "New Applicants"],
                vec!["8/1/2024 10:00:00", "Engineering", "Backend", "10"],
                vec!["8/3/2024 10:00:00", "Engineering", "Backend", "30"],
                vec!["8/2/2024 10:00:00", "engineering", "backend", "20"],
                vec!["", "", "", "99"],
                vec!["8/2/2024 09:00:00", "Sales", "AE", "7"],
            ],
        )
    }

    #[test]
    fn test_plain_extraction_skips_blank_key_rows() {
        let tab = tab();
        let plan = ExtractionPlan::new(spec()).key_fields(&["department", "role"]);
        let out = extract(&tab, &plan);
        assert_eq!(out.len(), 4);
        let first = out.records().next().unwrap();
        assert_eq!(first.text("role"), "Backend");
        assert_eq!(first.count("applicants"), 10);
        assert_eq!(first.text("missing"), "");
    }

    #[test]
    fn test_latest_per_key_keeps_newest_row() {
        let tab = tab();
        let plan = ExtractionPlan::new(spec())
            .key_fields(&["department", "role"])
            .latest_per_key(&["department", "role"], "timestamp");
        let out = extract(&tab, &plan);

        let counts: Vec<u32> = out.records().map(|r| r.count("applicants")).collect();
        assert_eq!(counts, vec![30, 7]);
    }

    #[test]
    fn test_unparseable_timestamp_sorts_as_epoch() {
        let tab = Tab::from_strings(
            "Form",
            vec![
                vec!["Timestamp", "Department", "Role", "New Applicants"],
                vec!["8/1/2024", "Eng", "Backend", "1"],
                vec!["whenever", "Eng", "Backend", "2"],
            ],
        );
        let plan = ExtractionPlan::new(spec()).latest_per_key(&["department", "role"], "timestamp");
        let out = extract(&tab, &plan);
        assert_eq!(out.records().next().unwrap().count("applicants"), 1);
    }

    #[test]
    fn test_equal_timestamps_later_row_wins() {
        let tab = Tab::from_strings(
            "Form",
            vec![
                vec!["Timestamp", "Department", "Role", "New Applicants"],
                vec!["nope", "Eng", "Backend", "1"],
                vec!["nope", "Eng", "Backend", "2"],
            ],
        );
        let plan = ExtractionPlan::new(spec()).latest_per_key(&["department", "role"], "timestamp");
        let out = extract(&tab, &plan);
        assert_eq!(out.records().next().unwrap().count("applicants"), 2);
    }

    #[test]
    fn test_fully_blank_rows_skipped_without_key_fields() {
        let tab = Tab::from_strings(
            "T",
            vec![vec!["Timestamp", "Role"], vec!["", " "], vec!["x", ""]],
        );
        let out = extract(&tab, &ExtractionPlan::new(spec()));
        assert_eq!(out.len(), 1);
    }
}
