//! Which tab feeds which extraction mode.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Tab, Workbook};

/// Tabs never scanned for department funnels (exact title, case-insensitive).
pub const EXCLUDED_TAB_TITLES: [&str; 2] = ["history", "config"];

/// Tabs never scanned for department funnels (title fragment).
pub const EXCLUDED_TAB_FRAGMENTS: [&str; 2] = ["form responses", "responses"];

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid title pattern"));

/// Lowercase, punctuation and underscores to single spaces: `"Form_Responses (1)"` → `"form responses 1"`.
pub fn normalize_title(title: &str) -> String {
    NON_ALNUM
        .replace_all(&title.to_lowercase(), " ")
        .trim()
        .to_string()
}

fn title_is(tab: &Tab, wanted: &str) -> bool {
    tab.title.trim().eq_ignore_ascii_case(wanted)
}

fn title_contains(tab: &Tab, fragment: &str) -> bool {
    normalize_title(&tab.title).contains(fragment)
}

/// True if `title` is a department tab for role-tab extraction.
pub fn is_department_tab(title: &str, extra_excluded: &[String]) -> bool {
    let trimmed = title.trim();
    let lower = trimmed.to_lowercase();
    if EXCLUDED_TAB_TITLES.iter().any(|t| lower == *t) {
        return false;
    }
    if extra_excluded.iter().any(|t| t.trim().eq_ignore_ascii_case(trimmed)) {
        return false;
    }
    !EXCLUDED_TAB_FRAGMENTS.iter().any(|f| lower.contains(f))
}

pub fn department_tabs<'a>(workbook: &'a Workbook, extra_excluded: &[String]) -> Vec<&'a Tab> {
    workbook
        .tabs
        .iter()
        .filter(|t| is_department_tab(&t.title, extra_excluded))
        .collect()
}

/// `Form Responses 1`-style tab, else any tab mentioning `form`.
pub fn find_form_tab(workbook: &Workbook) -> Option<&Tab> {
    workbook
        .tabs
        .iter()
        .find(|t| title_contains(t, "form responses"))
        .or_else(|| workbook.tabs.iter().find(|t| title_contains(t, "form")))
}

pub fn find_funnel_analysis_tab(workbook: &Workbook) -> Option<&Tab> {
    workbook.tabs.iter().find(|t| title_is(t, "funnel analysis"))
}

pub fn find_key_wins_tab(workbook: &Workbook) -> Option<&Tab> {
    workbook
        .tabs
        .iter()
        .find(|t| title_is(t, "key wins"))
        .or_else(|| workbook.tabs.iter().find(|t| title_contains(t, "key win")))
}

/// Daily-update tab, else the form responses tab, else the first tab.
pub fn find_daily_updates_tab(workbook: &Workbook) -> Option<&Tab> {
    let tabs = &workbook.tabs;
    tabs.iter()
        .find(|t| title_is(t, "daily update") || title_is(t, "daily updates"))
        .or_else(|| tabs.iter().find(|t| title_contains(t, "daily update")))
        .or_else(|| tabs.iter().find(|t| title_contains(t, "form responses")))
        .or_else(|| tabs.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook(titles: &[&str]) -> Workbook {
        Workbook::new(titles.iter().map(|t| Tab::new(*t, vec![])).collect())
    }

    #[test]
    fn test_config_and_history_never_department_tabs() {
        assert!(!is_department_tab("Config", &[]));
        assert!(!is_department_tab(" HISTORY ", &[]));
        assert!(!is_department_tab("Form Responses 1", &[]));
        assert!(!is_department_tab("Survey responses", &[]));
        assert!(is_department_tab("Engineering", &[]));
        assert!(is_department_tab("Config Notes", &[]));
    }

    #[test]
    fn test_extra_excluded_tabs() {
        let extra = vec!["Key Wins".to_string()];
        assert!(!is_department_tab("key wins", &extra));
        let wb = workbook(&["Engineering", "Key Wins", "Config"]);
        let titles: Vec<&str> = department_tabs(&wb, &extra).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Engineering"]);
    }

    #[test]
    fn test_form_tab_prefers_form_responses() {
        let wb = workbook(&["Form Template", "Form_Responses (2)"]);
        assert_eq!(find_form_tab(&wb).unwrap().title, "Form_Responses (2)");

        let wb = workbook(&["Engineering", "Intake form"]);
        assert_eq!(find_form_tab(&wb).unwrap().title, "Intake form");

        assert!(find_form_tab(&workbook(&["Engineering"])).is_none());
    }

    #[test]
    fn test_funnel_analysis_is_exact() {
        assert!(find_funnel_analysis_tab(&workbook(&["Funnel Analysis"])).is_some());
        assert!(find_funnel_analysis_tab(&workbook(&["Funnel Analysis v2"])).is_none());
    }

    #[test]
    fn test_key_wins_tab() {
        assert_eq!(find_key_wins_tab(&workbook(&["Q3 Key Wins", "Key Wins"])).unwrap().title, "Key Wins");
        assert_eq!(find_key_wins_tab(&workbook(&["Q3 Key Wins"])).unwrap().title, "Q3 Key Wins");
        assert!(find_key_wins_tab(&workbook(&["Engineering"])).is_none());
    }

    #[test]
    fn test_daily_updates_fallback_chain() {
        assert_eq!(find_daily_updates_tab(&workbook(&["A", "Daily Updates"])).unwrap().title, "Daily Updates");
        assert_eq!(find_daily_updates_tab(&workbook(&["A", "TA Daily Update Log"])).unwrap().title, "TA Daily Update Log");
        assert_eq!(find_daily_updates_tab(&workbook(&["A", "Form Responses 1"])).unwrap().title, "Form Responses 1");
        assert_eq!(find_daily_updates_tab(&workbook(&["A", "B"])).unwrap().title, "A");
        assert!(find_daily_updates_tab(&Workbook::default()).is_none());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Form_Responses (1)"), "form responses 1");
    }
}
