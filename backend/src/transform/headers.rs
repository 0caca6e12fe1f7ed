//! Header resolution by declarative match predicates.
//!
//! A [`FieldSpec`] lists, per output field, the [`Matcher`]s that identify its
//! column. [`resolve`] evaluates a field spec once against a header row and
//! returns an immutable [`ColumnMap`]. For each field the first header (left
//! to right) satisfying any of its matchers wins; a field with no matching
//! header is absent, which the decoder turns into a default value.
//!
//! ```text
//! headers: ["Timestamp", "Department", "Role / Position", "Remarks"]
//! spec:    date       -> [contains "timestamp", starts_with "date"]
//!          role       -> [contains "role", contains "position"]
//!          country    -> [contains "country"]
//! map:     date = 0, role = 2, country = -1
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Sentinel reported for columns that are absent.
pub const NOT_FOUND: i64 = -1;

/// A pure, case-insensitive predicate over one header string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Matcher {
    /// Whole header equals the value.
    Equals(String),
    /// Header contains the value.
    Contains(String),
    /// Header starts with the value.
    StartsWith(String),
    /// [`normalize`]d header contains the value (e.g. `last_updated`).
    NormalizedContains(String),
}

impl Matcher {
    pub fn equals(value: &str) -> Self {
        Matcher::Equals(value.to_lowercase())
    }

    pub fn contains(value: &str) -> Self {
        Matcher::Contains(value.to_lowercase())
    }

    pub fn starts_with(value: &str) -> Self {
        Matcher::StartsWith(value.to_lowercase())
    }

    pub fn normalized_contains(value: &str) -> Self {
        Matcher::NormalizedContains(normalize(value))
    }

    pub fn matches(&self, header: &str) -> bool {
        let header = header.trim().to_lowercase();
        match self {
            Matcher::Equals(v) => header == v.to_lowercase(),
            Matcher::Contains(v) => header.contains(&v.to_lowercase()),
            Matcher::StartsWith(v) => header.starts_with(&v.to_lowercase()),
            Matcher::NormalizedContains(v) => normalize(&header).contains(&normalize(v)),
        }
    }
}

/// Lowercase, collapse every run of non-alphanumerics into `_`, trim `_`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// True if any matcher accepts the header.
pub fn matches_any(header: &str, matchers: &[Matcher]) -> bool {
    matchers.iter().any(|m| m.matches(header))
}

/// Index of the first header accepted by any matcher.
pub fn position(headers: &[String], matchers: &[Matcher]) -> Option<usize> {
    headers.iter().position(|h| matches_any(h, matchers))
}

/// Like [`position`], but [`NOT_FOUND`] when no header matches.
pub fn find_header(headers: &[String], matchers: &[Matcher]) -> i64 {
    position(headers, matchers)
        .and_then(|i| i64::try_from(i).ok())
        .unwrap_or(NOT_FOUND)
}

/// One field and the matchers that locate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: String,
    pub matchers: Vec<Matcher>,
}

/// Ordered field-to-matchers table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub rules: Vec<FieldRule>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: &str, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        self.rules.push(FieldRule {
            field: field.to_string(),
            matchers: matchers.into_iter().collect(),
        });
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.field.as_str())
    }
}

/// Resolved column positions, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: Vec<(String, Option<usize>)>,
}

impl ColumnMap {
    pub fn get(&self, field: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, idx)| *idx)
    }

    /// Column index, or [`NOT_FOUND`].
    pub fn index(&self, field: &str) -> i64 {
        self.get(field)
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(NOT_FOUND)
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Fields that resolved to a column, in field order.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, usize)> {
        self.columns
            .iter()
            .filter_map(|(name, idx)| idx.map(|i| (name.as_str(), i)))
    }

    pub fn missing(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Serialize for ColumnMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, _) in &self.columns {
            map.serialize_entry(name, &self.index(name))?;
        }
        map.end()
    }
}

/// Evaluate `spec` against a header row.
pub fn resolve(headers: &[String], spec: &FieldSpec) -> ColumnMap {
    ColumnMap {
        columns: spec
            .rules
            .iter()
            .map(|rule| (rule.field.clone(), position(headers, &rule.matchers)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matchers_are_case_insensitive() {
        assert!(Matcher::contains("remark").matches("  REMARKS "));
        assert!(Matcher::starts_with("date").matches("Date of Hire"));
        assert!(!Matcher::starts_with("date").matches("Update Date"));
        assert!(Matcher::equals("config").matches("Config"));
        assert!(!Matcher::equals("config").matches("Config 2"));
    }

    #[test]
    fn test_normalized_contains() {
        let m = Matcher::normalized_contains("last_updated");
        assert!(m.matches("Last Updated"));
        assert!(m.matches("last-updated"));
        assert!(m.matches("Last_Updated"));
        assert!(!m.matches("Updated"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Form Responses 1 "), "form_responses_1");
        assert_eq!(normalize("Role / Position"), "role_position");
        assert_eq!(normalize("--"), "");
    }

    #[test]
    fn test_first_matching_header_wins() {
        let spec = FieldSpec::new().field("role", [Matcher::contains("role"), Matcher::contains("position")]);
        let map = resolve(&headers(&["Position", "Role"]), &spec);
        assert_eq!(map.get("role"), Some(0));
    }

    #[test]
    fn test_find_header() {
        let h = headers(&["Date", "  DEPARTMENT ", "Position"]);
        assert_eq!(find_header(&h, &[Matcher::contains("department")]), 1);
        assert_eq!(find_header(&h, &[Matcher::equals("position")]), 2);
        assert_eq!(find_header(&h, &[Matcher::contains("remark")]), NOT_FOUND);
        assert_eq!(find_header(&[], &[Matcher::contains("date")]), -1);
    }

    #[test]
    fn test_absent_column_is_minus_one() {
        let spec = FieldSpec::new()
            .field("date", [Matcher::starts_with("date")])
            .field("country", [Matcher::contains("country")]);
        let map = resolve(&headers(&["Date", "TA Name"]), &spec);

        assert_eq!(map.index("date"), 0);
        assert_eq!(map.index("country"), NOT_FOUND);
        assert_eq!(map.index("never-declared"), NOT_FOUND);
        assert_eq!(map.missing(), vec!["country"]);
    }

    #[test]
    fn test_column_map_serializes_sentinel() {
        let spec = FieldSpec::new()
            .field("date", [Matcher::starts_with("date")])
            .field("remarks", [Matcher::contains("remark")]);
        let map = resolve(&headers(&["Date"]), &spec);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["date"], 0);
        assert_eq!(json["remarks"], -1);
    }

    #[test]
    fn test_matcher_serde_shape() {
        let json = serde_json::to_value(Matcher::contains("Remark")).unwrap();
        assert_eq!(json["type"], "contains");
        assert_eq!(json["value"], "remark");
    }
}
