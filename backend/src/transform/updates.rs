//! Flat extraction: key wins and daily TA updates.

use serde::{Deserialize, Serialize};

use super::dates::{parse_any, DateWindow};
use super::extract::{extract, ExtractionPlan, Record};
use super::headers::{FieldSpec, Matcher};
use super::tabs::{find_daily_updates_tab, find_key_wins_tab};
use crate::models::{DailyUpdate, KeyWin, Tab, Workbook};

fn date_matchers() -> [Matcher; 2] {
    [Matcher::starts_with("date"), Matcher::contains("timestamp")]
}

fn department_matchers() -> [Matcher; 2] {
    [Matcher::contains("department"), Matcher::starts_with("dept")]
}

fn role_matchers() -> [Matcher; 2] {
    [Matcher::contains("position"), Matcher::contains("role")]
}

fn in_window(window: Option<&DateWindow>, date: &str) -> bool {
    window.map_or(true, |w| w.admits(date, parse_any))
}

// =============================================================================
// Key wins
// =============================================================================

fn key_wins_plan() -> ExtractionPlan {
    let spec = FieldSpec::new()
        .field("date", date_matchers())
        .field("department", department_matchers())
        .field("position", role_matchers())
        .field("remarks", [Matcher::contains("remark")]);
    ExtractionPlan::new(spec).key_fields(&["date", "department", "position"])
}

pub fn key_wins_from_tab(tab: &Tab, window: Option<&DateWindow>) -> Vec<KeyWin> {
    let extraction = extract(tab, &key_wins_plan());
    extraction
        .records()
        .map(|r| KeyWin {
            date: r.string("date"),
            department: r.string("department"),
            position: r.string("position"),
            remarks: r.string("remarks"),
        })
        .filter(|win| in_window(window, &win.date))
        .collect()
}

/// Key wins from the `Key Wins` tab; empty when the workbook has none.
pub fn key_wins(workbook: &Workbook, window: Option<&DateWindow>) -> Vec<KeyWin> {
    find_key_wins_tab(workbook)
        .map(|tab| key_wins_from_tab(tab, window))
        .unwrap_or_default()
}

// =============================================================================
// Daily updates
// =============================================================================

/// Equality filters from the request. Empty or `all` disables a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUpdateFilters {
    pub department: Option<String>,
    pub ta_name: Option<String>,
    pub country: Option<String>,
}

impl DailyUpdateFilters {
    pub fn admits(&self, update: &DailyUpdate) -> bool {
        field_matches(self.department.as_deref(), &update.department)
            && field_matches(self.ta_name.as_deref(), &update.ta_name)
            && field_matches(self.country.as_deref(), &update.country)
    }
}

fn field_matches(wanted: Option<&str>, value: &str) -> bool {
    match wanted.map(str::trim) {
        None | Some("") => true,
        Some(w) if w.eq_ignore_ascii_case("all") => true,
        Some(w) => w.to_lowercase() == value.trim().to_lowercase(),
    }
}

fn daily_updates_plan() -> ExtractionPlan {
    let spec = FieldSpec::new()
        .field("date", date_matchers())
        .field(
            "ta_name",
            [
                Matcher::contains("ta name"),
                Matcher::normalized_contains("ta_name"),
                Matcher::contains("recruiter"),
                Matcher::equals("ta"),
                Matcher::starts_with("ta "),
            ],
        )
        .field("department", department_matchers())
        .field("country", [Matcher::contains("country")])
        .field("role", [Matcher::contains("role"), Matcher::contains("position")])
        .field("openings", [Matcher::contains("opening")])
        .field("scheduled", [Matcher::contains("scheduled")])
        .field("completed", [Matcher::contains("completed")])
        .field(
            "cancelled",
            [Matcher::contains("cancel"), Matcher::contains("no show"), Matcher::contains("no-show")],
        )
        .field("offers", [Matcher::contains("offer")])
        .field("pending", [Matcher::contains("pending"), Matcher::contains("feedback")])
        .field("upcoming", [Matcher::contains("upcoming")])
        .field("remarks", [Matcher::contains("remark")]);
    ExtractionPlan::new(spec).key_fields(&["date", "ta_name", "department", "role"])
}

fn daily_update(r: &Record<'_>) -> DailyUpdate {
    DailyUpdate {
        date: r.string("date"),
        ta_name: r.string("ta_name"),
        department: r.string("department"),
        country: r.string("country"),
        role: r.string("role"),
        number_of_openings: r.count("openings"),
        interviews_scheduled: r.count("scheduled"),
        interviews_completed: r.count("completed"),
        cancelled_no_show: r.count("cancelled"),
        offers_made: r.count("offers"),
        pending_interview_feedback: r.count("pending"),
        upcoming_hm_interviews: r.count("upcoming"),
        remarks: r.string("remarks"),
    }
}

pub fn daily_updates_from_tab(
    tab: &Tab,
    window: Option<&DateWindow>,
    filters: &DailyUpdateFilters,
) -> Vec<DailyUpdate> {
    let extraction = extract(tab, &daily_updates_plan());
    extraction
        .records()
        .map(|r| daily_update(&r))
        .filter(|u| in_window(window, &u.date))
        .filter(|u| filters.admits(u))
        .collect()
}

pub fn daily_updates(
    workbook: &Workbook,
    window: Option<&DateWindow>,
    filters: &DailyUpdateFilters,
) -> Vec<DailyUpdate> {
    find_daily_updates_tab(workbook)
        .map(|tab| daily_updates_from_tab(tab, window, filters))
        .unwrap_or_default()
}
