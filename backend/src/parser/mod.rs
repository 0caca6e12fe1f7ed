//! Local tab loading: CSV exports and JSON workbook snapshots.
//!
//! CSV exports come out of spreadsheet tools in whatever encoding and
//! separator the user's locale picked, so both are auto-detected. Every CSV
//! field becomes a cell carrying its text (the header row included); rows
//! may have different lengths.

use crate::error::{CsvError, CsvResult, SourceResult};
use crate::models::{Cell, Row, Tab, Workbook};

/// A parsed CSV tab with detection metadata.
#[derive(Debug, Clone)]
pub struct ParsedTab {
    pub tab: Tab,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text into a tab with an explicit delimiter.
pub fn parse_tab_str(title: &str, content: &str, delimiter: char) -> CsvResult<Tab> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| CsvError::ParseError(format!("unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::new).collect());
    }

    if rows.is_empty() {
        return Err(CsvError::EmptyFile);
    }
    Ok(Tab::new(title, rows))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_tab_bytes(title: &str, bytes: &[u8]) -> CsvResult<ParsedTab> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(content);
    let tab = parse_tab_str(title, content, delimiter)?;

    Ok(ParsedTab {
        tab,
        encoding,
        delimiter,
    })
}

/// Load a `{"tabs": [...]}` workbook snapshot.
pub fn parse_workbook_json(content: &str) -> SourceResult<Workbook> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let tab = parse_tab_str("Engineering", "Role,Applied\nBackend,10\nFrontend,4", ',').unwrap();

        assert_eq!(tab.title, "Engineering");
        assert_eq!(tab.headers(), vec!["Role", "Applied"]);
        assert_eq!(tab.data_rows().len(), 2);
        assert_eq!(tab.rows[2][1].text(), Some("4"));
    }

    #[test]
    fn test_quoted_values() {
        let csv = "Role;Remarks\n\"Backend\";\"Hello; World\"";
        let tab = parse_tab_str("T", csv, ';').unwrap();
        assert_eq!(tab.rows[1][1].text(), Some("Hello; World"));
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let tab = parse_tab_str("T", "a,b,c\n1\n1,2,3,4", ',').unwrap();
        assert_eq!(tab.rows[1].len(), 1);
        assert_eq!(tab.rows[2].len(), 4);
    }

    #[test]
    fn test_empty_csv_error() {
        let result = parse_tab_str("T", "", ',');
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_auto_parse_strips_bom() {
        let bytes = "\u{feff}Date;Department\n2024-08-05;Engineering".as_bytes();
        let parsed = parse_tab_bytes("Key Wins", bytes).unwrap();

        assert_eq!(parsed.delimiter, ';');
        assert_eq!(parsed.tab.headers(), vec!["Date", "Department"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_workbook_json() {
        let wb = parse_workbook_json(r#"{"tabs":[{"title":"Key Wins","rows":[["Date"],["2024-08-05"]]}]}"#).unwrap();
        assert_eq!(wb.tabs[0].data_rows().len(), 1);
        assert!(parse_workbook_json("{").is_err());
    }
}
