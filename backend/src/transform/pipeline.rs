//! Request orchestration: fetch one workbook snapshot, transform, fall back.
//!
//! Every operation here is infallible. A missing source, a missing source id
//! or a failed fetch logs exactly one warning and resolves to the canned
//! placeholder dashboard (roles) or an empty list (key wins, daily updates).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use talentfunnel::{DashboardQuery, DashboardService, SnapshotSource, TransformSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = DashboardService::new(
//!         Some(Arc::new(SnapshotSource::new("snapshots"))),
//!         Some("default".to_string()),
//!         TransformSettings::default(),
//!     );
//!     let roles = service.dashboard(&DashboardQuery::default()).await;
//!     println!("{} roles", roles.len());
//! }
//! ```

use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use super::dashboard::{build_roles, RoleContext};
use super::dates::{offset_from_hours, DateWindow};
use super::placeholder::placeholder_roles;
use super::stages::{today_in, ActivityRule};
use super::updates::{daily_updates, key_wins, DailyUpdateFilters};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::models::{DailyUpdate, KeyWin, Role, Workbook};
use crate::source::TabularSource;

/// Hours east of UTC used for date windows when nothing is configured.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Knobs shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformSettings {
    /// Offset used to turn window bounds into calendar dates and to compute "today".
    pub offset: FixedOffset,
    pub activity: ActivityRule,
    /// Extra tab titles skipped by role-tab extraction.
    pub excluded_tabs: Vec<String>,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            offset: offset_from_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or_else(|| Utc.fix()),
            activity: ActivityRule::default(),
            excluded_tabs: Vec::new(),
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// `GET /dashboard` parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub force_form: Option<String>,
}

impl DashboardQuery {
    pub fn force_form(&self) -> bool {
        self.force_form.as_deref().is_some_and(is_truthy)
    }
}

/// `GET /key-wins` parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyWinsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// `GET /daily-updates` parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyUpdatesQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub dept: Option<String>,
    pub ta: Option<String>,
    pub country: Option<String>,
}

impl DailyUpdatesQuery {
    pub fn filters(&self) -> DailyUpdateFilters {
        DailyUpdateFilters {
            department: self.dept.clone(),
            ta_name: self.ta.clone(),
            country: self.country.clone(),
        }
    }
}

/// `1`, `true`, `yes` or `on`, any case.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// =============================================================================
// Service
// =============================================================================

/// Holds the source collaborator and settings; cheap to clone into handlers.
#[derive(Clone)]
pub struct DashboardService {
    source: Option<Arc<dyn TabularSource>>,
    source_id: Option<String>,
    settings: TransformSettings,
}

impl DashboardService {
    pub fn new(
        source: Option<Arc<dyn TabularSource>>,
        source_id: Option<String>,
        settings: TransformSettings,
    ) -> Self {
        Self {
            source,
            source_id,
            settings,
        }
    }

    pub fn settings(&self) -> &TransformSettings {
        &self.settings
    }

    /// Source description, `None` when no source is configured.
    pub fn source_description(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.describe())
    }

    fn window(&self, start: Option<&str>, end: Option<&str>) -> Option<DateWindow> {
        DateWindow::from_query(start, end, self.settings.offset)
    }

    /// One fetch attempt. `None` means the caller must fall back; the
    /// warning has already been logged.
    async fn fetch(&self, fallback: &str) -> Option<Workbook> {
        let Some(source) = self.source.as_ref() else {
            log_warning(format!("No tabular source configured, serving {}", fallback));
            return None;
        };
        let Some(source_id) = self.source_id.as_deref().filter(|id| !id.trim().is_empty()) else {
            log_warning(format!("No source id configured, serving {}", fallback));
            return None;
        };

        match source.fetch_workbook(source_id).await {
            Ok(workbook) => {
                log_info(format!(
                    "Fetched {} tabs from {}",
                    workbook.tabs.len(),
                    source.describe()
                ));
                Some(workbook)
            }
            Err(e) => {
                log_warning(format!("Source fetch failed ({}), serving {}", e, fallback));
                None
            }
        }
    }

    /// Roles for the dashboard; placeholder roles when the source is unavailable.
    pub async fn dashboard(&self, query: &DashboardQuery) -> Vec<Role> {
        let span = tracing::info_span!("dashboard", request_id = %Uuid::new_v4());
        async {
            let Some(workbook) = self.fetch("placeholder dashboard").await else {
                return placeholder_roles();
            };

            let ctx = RoleContext {
                window: self.window(query.start.as_deref(), query.end.as_deref()),
                activity: self.settings.activity,
                today: today_in(self.settings.offset),
                excluded_tabs: self.settings.excluded_tabs.clone(),
            };
            let (roles, mode) = build_roles(&workbook, &ctx, query.force_form());
            log_success(format!("Built {} roles ({:?})", roles.len(), mode));
            roles
        }
        .instrument(span)
        .await
    }

    /// Key wins; empty when the source is unavailable.
    pub async fn key_wins(&self, query: &KeyWinsQuery) -> Vec<KeyWin> {
        let span = tracing::info_span!("key_wins", request_id = %Uuid::new_v4());
        async {
            let Some(workbook) = self.fetch("no key wins").await else {
                return Vec::new();
            };

            let window = self.window(query.start.as_deref(), query.end.as_deref());
            let wins = key_wins(&workbook, window.as_ref());
            log_success(format!("Extracted {} key wins", wins.len()));
            wins
        }
        .instrument(span)
        .await
    }

    /// Daily TA updates; empty when the source is unavailable.
    pub async fn daily_updates(&self, query: &DailyUpdatesQuery) -> Vec<DailyUpdate> {
        let span = tracing::info_span!("daily_updates", request_id = %Uuid::new_v4());
        async {
            let Some(workbook) = self.fetch("no daily updates").await else {
                return Vec::new();
            };

            let window = self.window(query.start.as_deref(), query.end.as_deref());
            let updates = daily_updates(&workbook, window.as_ref(), &query.filters());
            log_success(format!("Extracted {} daily updates", updates.len()));
            updates
        }
        .instrument(span)
        .await
    }
}
