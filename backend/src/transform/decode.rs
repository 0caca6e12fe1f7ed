//! Cell decoding. Never fails: absent columns and cells decode to `""` / `0`.

use crate::models::Row;

/// Trimmed display value of `row[index]`, or `""`.
pub fn cell_text(row: &Row, index: Option<usize>) -> &str {
    index
        .and_then(|i| row.get(i))
        .and_then(|cell| cell.text())
        .map(str::trim)
        .unwrap_or("")
}

/// Candidate count in `row[index]`, or 0.
pub fn cell_count(row: &Row, index: Option<usize>) -> u32 {
    parse_count(cell_text(row, index))
}

/// Leading integer of `text` after dropping thousands separators.
///
/// `"1,234"` → 1234, `"12.7"` → 12, `"40 candidates"` → 40,
/// `""`, `"n/a"`, `"-3"` → 0.
pub fn parse_count(text: &str) -> u32 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse().unwrap_or(0)
}
