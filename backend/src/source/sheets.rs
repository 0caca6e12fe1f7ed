//! Google Sheets v4 grid-data client.
//!
//! One GET per request, asking only for tab titles and formatted cell
//! values:
//!
//! ```text
//! GET {base}/{spreadsheet_id}?includeGridData=true&fields=sheets(properties(title),data(rowData(values(formattedValue))))
//! ```
//!
//! Missing `data`, `rowData`, `values` or `formattedValue` mean an empty tab,
//! an empty row or an absent cell value respectively.

use async_trait::async_trait;
use serde::Deserialize;

use super::TabularSource;
use crate::error::{SourceError, SourceResult};
use crate::models::{Cell, Row, Tab, Workbook};

/// Public grid endpoint.
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const GRID_FIELDS: &str = "sheets(properties(title),data(rowData(values(formattedValue))))";

/// How requests are authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetsAuth {
    /// `key=` query parameter.
    ApiKey(String),
    /// `Authorization: Bearer` header.
    Bearer(String),
}

/// Sheets API client
#[derive(Debug, Clone)]
pub struct SheetsApiSource {
    client: reqwest::Client,
    base_url: String,
    auth: SheetsAuth,
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetJson>,
}

#[derive(Debug, Deserialize)]
struct SheetJson {
    #[serde(default)]
    properties: SheetProperties,
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    row_data: Vec<RowJson>,
}

#[derive(Debug, Deserialize)]
struct RowJson {
    #[serde(default)]
    values: Vec<CellJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellJson {
    formatted_value: Option<String>,
}

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

impl From<SheetJson> for Tab {
    fn from(sheet: SheetJson) -> Self {
        let rows: Vec<Row> = sheet
            .data
            .into_iter()
            .flat_map(|grid| grid.row_data)
            .map(|row| {
                row.values
                    .into_iter()
                    .map(|c| Cell { value: c.formatted_value })
                    .collect()
            })
            .collect();
        Tab::new(sheet.properties.title, rows)
    }
}

/// Decode a grid-data response body into a workbook.
pub fn decode_grid(body: &str) -> SourceResult<Workbook> {
    let response: SpreadsheetResponse = serde_json::from_str(body)?;
    Ok(Workbook::new(response.sheets.into_iter().map(Tab::from).collect()))
}

fn api_error(status: u16, body: &str) -> SourceError {
    let message = serde_json::from_str::<GoogleError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    SourceError::Api { status, message }
}

// =============================================================================
// Client
// =============================================================================

impl SheetsApiSource {
    pub fn new(auth: SheetsAuth) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            auth,
        }
    }

    /// Point the client at another endpoint (proxies, fakes in tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TabularSource for SheetsApiSource {
    async fn fetch_workbook(&self, source_id: &str) -> SourceResult<Workbook> {
        if source_id.trim().is_empty() {
            return Err(SourceError::MissingSourceId);
        }

        let url = format!("{}/{}", self.base_url, source_id.trim());
        let mut request = self
            .client
            .get(&url)
            .query(&[("includeGridData", "true"), ("fields", GRID_FIELDS)]);
        request = match &self.auth {
            SheetsAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            SheetsAuth::Bearer(token) => request.bearer_auth(token),
        };

        tracing::debug!(%url, "fetching spreadsheet grid data");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let workbook = decode_grid(&body)?;
        tracing::debug!(tabs = workbook.tabs.len(), "spreadsheet decoded");
        Ok(workbook)
    }

    fn describe(&self) -> String {
        let auth = match self.auth {
            SheetsAuth::ApiKey(_) => "api key",
            SheetsAuth::Bearer(_) => "bearer token",
        };
        format!("Google Sheets API at {} ({})", self.base_url, auth)
    }
}
