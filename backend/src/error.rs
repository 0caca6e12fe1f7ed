//! Error types for the funnel dashboard backend.
//!
//! - [`ConfigError`] - environment / `.env` configuration errors
//! - [`CsvError`] - local tab (CSV) loading errors
//! - [`SourceError`] - tabular source fetch errors
//! - [`ServerError`] - HTTP server errors
//!
//! The transformer itself never fails: malformed cells are defaulted and
//! malformed rows are dropped. Only fetching and configuration return errors,
//! and the orchestrator converts every [`SourceError`] into a fallback payload.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while loading a tab from a local CSV export.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        CsvError::ParseError(err.to_string())
    }
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors from the tabular source collaborator.
///
/// Every variant is treated as "source unavailable" by the orchestrator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No source is configured (no credentials, no snapshot directory).
    #[error("Tabular source unavailable: {0}")]
    Unavailable(String),

    /// A source is configured but no source identifier was given.
    #[error("Missing source identifier (set DASHBOARD_SHEET_ID)")]
    MissingSourceId,

    /// HTTP request failed before a response was received.
    #[error("Request failed: {0}")]
    Request(String),

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded into a workbook.
    #[error("Failed to decode workbook: {0}")]
    Decode(String),

    /// Local snapshot IO error.
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Local snapshot CSV error.
    #[error("Snapshot CSV error: {0}")]
    Csv(#[from] CsvError),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error at startup.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for CSV loading.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for source fetches.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let source_err: SourceError = csv_err.into();
        assert!(source_err.to_string().contains("empty"));

        let config_err = ConfigError::InvalidValue {
            name: "PORT".into(),
            value: "abc".into(),
            reason: "not a number".into(),
        };
        let server_err: ServerError = config_err.into();
        assert!(server_err.to_string().contains("PORT"));
    }

    #[test]
    fn test_api_error_format() {
        let err = SourceError::Api {
            status: 403,
            message: "The caller does not have permission".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("permission"));
    }
}
