//! Funnel roles from the workbook.
//!
//! ```text
//! role tabs (always) ──▶ roles
//!        │ forceForm
//!        ▼
//! form responses (latest row per department+role) ──▶ roles, if any
//!        │ none
//!        ▼
//! "Funnel Analysis" tab (one row per role) ──▶ roles, if any
//!        │ none
//!        ▼
//! role-tab roles
//! ```

use chrono::NaiveDate;
use serde::Serialize;

use super::dates::{format_slash, parse_any, parse_slash, DateWindow};
use super::extract::{extract, ExtractionPlan, Record};
use super::headers::{matches_any, resolve, ColumnMap, FieldSpec, Matcher};
use super::stages::ActivityRule;
use super::tabs::{department_tabs, find_form_tab, find_funnel_analysis_tab};
use crate::models::{FunnelStage, Role, Tab, Workbook};

/// Role-tab headers that are never funnel stages.
pub const ROLE_TAB_NON_STAGE: [&str; 5] = ["position", "last_updated", "remark", "department", "role"];

/// Funnel-analysis headers that are never funnel stages.
pub const FUNNEL_ANALYSIS_NON_STAGE: [&str; 5] = ["position", "role", "department", "last_updated", "remark"];

/// Form stages in funnel order, each with a short header alias.
pub const FORM_STAGES: [(&str, &str); 8] = [
    ("New Applicants", "applicants"),
    ("Quiz Sent", "quiz sent"),
    ("Quiz Completed", "quiz completed"),
    ("Screened by TA", "screened"),
    ("Technical Assessment", "technical"),
    ("Interviewed by HM", "interviewed"),
    ("Offer Made", "offer"),
    ("Hired", "hired"),
];

/// Dropped from form roles when its count is zero.
pub const OPTIONAL_FORM_STAGE: &str = "Technical Assessment";

/// Which extraction produced a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardMode {
    RoleTabs,
    FormResponses,
    FunnelAnalysis,
}

/// Per-request inputs shared by every mode.
#[derive(Debug, Clone)]
pub struct RoleContext {
    pub window: Option<DateWindow>,
    pub activity: ActivityRule,
    pub today: NaiveDate,
    pub excluded_tabs: Vec<String>,
}

impl RoleContext {
    fn admits(&self, text: &str, parser: fn(&str) -> Option<chrono::NaiveDateTime>) -> bool {
        self.window.map_or(true, |w| w.admits(text, parser))
    }
}

fn non_stage(tokens: &[&str]) -> Vec<Matcher> {
    tokens.iter().map(|t| Matcher::normalized_contains(t)).collect()
}

/// Stage columns of a role tab: every non-empty header except the name
/// column and the non-stage headers, in column order.
pub fn stage_columns(headers: &[String], name_column: usize, excluded: &[Matcher]) -> Vec<(usize, String)> {
    headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != name_column && !h.is_empty() && !matches_any(h, excluded))
        .map(|(i, h)| (i, h.clone()))
        .collect()
}

// =============================================================================
// Role tabs
// =============================================================================

fn role_tab_spec() -> FieldSpec {
    FieldSpec::new()
        .field("remarks", [Matcher::contains("remark")])
        .field(
            "last_updated",
            [Matcher::normalized_contains("last_updated"), Matcher::contains("updated")],
        )
}

fn role_tab_stage_names(headers: &[String]) -> Vec<String> {
    stage_columns(headers, 0, &non_stage(&ROLE_TAB_NON_STAGE))
        .into_iter()
        .map(|(_, name)| name)
        .collect()
}

/// How role-tab extraction reads a department tab.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTabLayout {
    pub title: String,
    pub headers: Vec<String>,
    /// Stage headers in column order.
    pub stages: Vec<String>,
    /// Fuzzy-matched columns, `-1` when absent.
    pub columns: ColumnMap,
}

pub fn role_tab_layout(tab: &Tab) -> RoleTabLayout {
    let headers = tab.headers();
    RoleTabLayout {
        title: tab.title.clone(),
        stages: role_tab_stage_names(&headers),
        columns: resolve(&headers, &role_tab_spec()),
        headers,
    }
}

/// Roles from one department tab. Column 0 holds the role name.
pub fn roles_from_role_tab(tab: &Tab, ctx: &RoleContext) -> Vec<Role> {
    let extraction = extract(tab, &ExtractionPlan::new(role_tab_spec()));
    let stage_names = role_tab_stage_names(&extraction.headers);

    let mut roles = Vec::new();
    for record in extraction.records() {
        let role_name = record.text_at(0);
        if role_name.is_empty() {
            continue;
        }
        let last_updated = record.string("last_updated");

        let stages: Vec<FunnelStage> = stage_names
            .iter()
            .filter_map(|stage| {
                let column = extraction.headers.iter().position(|h| h == stage)?;
                Some(FunnelStage::new(stage.clone(), record.count_at(column), last_updated.clone()))
            })
            .collect();
        if stages.is_empty() {
            continue;
        }
        if !ctx.admits(&last_updated, parse_slash) {
            continue;
        }

        let is_active = ctx.activity.is_active(&last_updated, ctx.today);
        roles.push(Role::new(
            format!("{} - {}", tab.title, role_name),
            stages,
            record.string("remarks"),
            last_updated,
            is_active,
        ));
    }
    roles
}

/// Roles from every department tab, in tab order.
pub fn roles_from_role_tabs(workbook: &Workbook, ctx: &RoleContext) -> Vec<Role> {
    department_tabs(workbook, &ctx.excluded_tabs)
        .into_iter()
        .flat_map(|tab| roles_from_role_tab(tab, ctx))
        .collect()
}

// =============================================================================
// Form responses
// =============================================================================

fn form_spec() -> FieldSpec {
    let spec = FieldSpec::new()
        .field("timestamp", [Matcher::contains("timestamp"), Matcher::starts_with("date")])
        .field("department", [Matcher::contains("department"), Matcher::starts_with("dept")])
        .field("role", [Matcher::contains("role"), Matcher::contains("position")])
        .field("remarks", [Matcher::contains("remark")]);
    FORM_STAGES.iter().fold(spec, |spec, (stage, alias)| {
        spec.field(stage, [Matcher::contains(stage), Matcher::contains(alias)])
    })
}

fn join_name(department: &str, role: &str) -> String {
    match (department.is_empty(), role.is_empty()) {
        (false, false) => format!("{} - {}", department, role),
        (true, _) => role.to_string(),
        (false, true) => department.to_string(),
    }
}

/// Roles from the form-responses tab: the latest submission per
/// (department, role), using only the stage columns the tab has.
pub fn roles_from_form_tab(tab: &Tab, ctx: &RoleContext) -> Vec<Role> {
    let plan = ExtractionPlan::new(form_spec())
        .key_fields(&["department", "role"])
        .latest_per_key(&["department", "role"], "timestamp");
    let extraction = extract(tab, &plan);

    extraction
        .records()
        .filter(|record| ctx.admits(record.text("timestamp"), parse_any))
        .filter_map(|record| form_role(&record, ctx))
        .collect()
}

fn form_role(record: &Record<'_>, ctx: &RoleContext) -> Option<Role> {
    let raw_timestamp = record.text("timestamp");
    let last_updated = parse_any(raw_timestamp)
        .map(|ts| format_slash(&ts))
        .unwrap_or_else(|| raw_timestamp.to_string());

    let stages: Vec<FunnelStage> = FORM_STAGES
        .iter()
        .filter(|(stage, _)| record.has(stage))
        .map(|(stage, _)| FunnelStage::new(*stage, record.count(stage), last_updated.clone()))
        .collect();
    if stages.is_empty() {
        return None;
    }

    let is_active = ctx.activity.is_active(&last_updated, ctx.today);
    let mut role = Role::new(
        join_name(record.text("department"), record.text("role")),
        stages,
        record.string("remarks"),
        last_updated,
        is_active,
    );
    role.drop_empty_stage(OPTIONAL_FORM_STAGE);
    Some(role)
}

// =============================================================================
// Funnel analysis
// =============================================================================

fn funnel_analysis_spec() -> FieldSpec {
    FieldSpec::new()
        .field("name", [Matcher::contains("role"), Matcher::contains("position")])
        .field("department", [Matcher::contains("department"), Matcher::starts_with("dept")])
        .field("remarks", [Matcher::contains("remark")])
        .field(
            "last_updated",
            [Matcher::normalized_contains("last_updated"), Matcher::contains("updated")],
        )
}

/// Roles from a pre-aggregated tab, one row per role, no dedup.
pub fn roles_from_funnel_analysis(tab: &Tab, ctx: &RoleContext) -> Vec<Role> {
    let extraction = extract(tab, &ExtractionPlan::new(funnel_analysis_spec()));
    let name_column = extraction.columns.get("name").unwrap_or(0);
    let stage_cols = stage_columns(&extraction.headers, name_column, &non_stage(&FUNNEL_ANALYSIS_NON_STAGE));

    let mut roles = Vec::new();
    for record in extraction.records() {
        let role_name = record.text_at(name_column);
        if role_name.is_empty() {
            continue;
        }
        let last_updated = record.string("last_updated");
        if !ctx.admits(&last_updated, parse_any) {
            continue;
        }

        let stages: Vec<FunnelStage> = stage_cols
            .iter()
            .map(|(column, stage)| FunnelStage::new(stage.clone(), record.count_at(*column), last_updated.clone()))
            .collect();
        if stages.is_empty() {
            continue;
        }

        let is_active = ctx.activity.is_active(&last_updated, ctx.today);
        roles.push(Role::new(
            join_name(record.text("department"), role_name),
            stages,
            record.string("remarks"),
            last_updated,
            is_active,
        ));
    }
    roles
}

// =============================================================================
// Mode selection
// =============================================================================

/// Role-tab roles, replaced by form-driven roles when `force_form` is set
/// and the form (or its funnel-analysis fallback) yields anything.
pub fn build_roles(workbook: &Workbook, ctx: &RoleContext, force_form: bool) -> (Vec<Role>, DashboardMode) {
    let baseline = roles_from_role_tabs(workbook, ctx);
    if !force_form {
        return (baseline, DashboardMode::RoleTabs);
    }

    let form_roles = find_form_tab(workbook)
        .map(|tab| roles_from_form_tab(tab, ctx))
        .unwrap_or_default();
    if !form_roles.is_empty() {
        return (form_roles, DashboardMode::FormResponses);
    }

    let analysis_roles = find_funnel_analysis_tab(workbook)
        .map(|tab| roles_from_funnel_analysis(tab, ctx))
        .unwrap_or_default();
    if !analysis_roles.is_empty() {
        return (analysis_roles, DashboardMode::FunnelAnalysis);
    }

    (baseline, DashboardMode::RoleTabs)
}
