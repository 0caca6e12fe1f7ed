//! # Talentfunnel - recruiting spreadsheet to dashboard records
//!
//! Talentfunnel reads a loosely structured recruiting spreadsheet (one tab per
//! department, a form-responses tab, key wins, daily TA updates) and reshapes
//! it into typed records for the funnel dashboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│  Workbook   │────▶│  Transform  │────▶│    JSON     │
//! │ (API/CSV)   │     │ (tabs/rows) │     │ (3 modes)   │     │ roles/wins  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                 source down ───┴──▶ placeholder / empty
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use talentfunnel::{AppConfig, DashboardQuery};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = AppConfig::from_env().unwrap().service();
//!     let roles = service.dashboard(&DashboardQuery::default()).await;
//!     println!("{} roles", roles.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`config`] - Environment configuration
//! - [`models`] - Workbook input and dashboard output models
//! - [`parser`] - CSV / JSON snapshot loading with auto-detection
//! - [`source`] - Tabular source trait and implementations
//! - [`transform`] - Header resolution, extraction modes, orchestration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Loading
pub mod parser;
pub mod source;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors and config
// =============================================================================

pub use config::AppConfig;
pub use error::{ConfigError, CsvError, ServerError, SourceError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, ConversionRate, DailyUpdate, FunnelStage, KeyWin, Role, Row, Tab, Workbook};

// =============================================================================
// Re-exports - Sources
// =============================================================================

pub use parser::{detect_delimiter, detect_encoding, parse_tab_bytes, ParsedTab};
pub use source::{SheetsApiSource, SheetsAuth, SnapshotSource, StaticSource, TabularSource, DEFAULT_SNAPSHOT_ID};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    build_roles, daily_updates, key_wins, placeholder_roles, ActivityRule, ColumnMap,
    DailyUpdateFilters, DailyUpdatesQuery, DashboardMode, DashboardQuery, DashboardService,
    DateWindow, KeyWinsQuery, RoleContext, TransformSettings,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::{build_router, serve_from_env, serve_from_lookup, start_server, AppState};
