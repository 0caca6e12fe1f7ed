//! REST API types for the dashboard frontend.
//!
//! Query parameter structs live with the orchestrator
//! ([`crate::transform::pipeline`]) and are re-exported here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{DailyUpdate, KeyWin, Role};

pub use crate::transform::pipeline::{DailyUpdatesQuery, DashboardQuery, KeyWinsQuery};

/// `GET /dashboard`
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub roles: Vec<Role>,
}

/// `GET /key-wins`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyWinsResponse {
    pub wins: Vec<KeyWin>,
}

/// `GET /daily-updates`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUpdatesResponse {
    pub updates: Vec<DailyUpdate>,
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub source_configured: bool,
    /// Human-readable source description, when configured.
    pub source: Option<String>,
}

impl HealthResponse {
    pub fn new(source: Option<String>) -> Self {
        Self {
            status: "ok".to_string(),
            service: "talentfunnel".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            source_configured: source.is_some(),
            source,
        }
    }
}

/// Placeholder body for `GET /export/csv`.
pub const EXPORT_CSV_PLACEHOLDER: &[u8] = b"role,stage,candidate_count\n";

/// Placeholder body for `GET /export/pdf`.
pub const EXPORT_PDF_PLACEHOLDER: &[u8] = b"%PDF-1.4\n% export not available\n%%EOF\n";

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "requestId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}
