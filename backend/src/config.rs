//! Runtime configuration from the environment (and `.env`, loaded by the binary).
//!
//! | Variable                       | Default                                        |
//! |--------------------------------|------------------------------------------------|
//! | `DASHBOARD_SHEET_ID`           | unset: `local` with a snapshot dir, else none  |
//! | `GOOGLE_SHEETS_API_KEY`        | unset                                          |
//! | `GOOGLE_SHEETS_ACCESS_TOKEN`   | unset, wins over the API key                   |
//! | `SHEETS_API_BASE_URL`          | `https://sheets.googleapis.com/v4/spreadsheets`|
//! | `DASHBOARD_SNAPSHOT_DIR`       | unset, wins over the Sheets API                |
//! | `DASHBOARD_UTC_OFFSET_HOURS`   | `8`                                            |
//! | `DASHBOARD_ACTIVE_WITHIN_DAYS` | unset: every role active                       |
//! | `DASHBOARD_EXCLUDED_TABS`      | unset                                          |
//! | `PORT`                         | `3001`                                         |
//!
//! Empty values count as unset. Values that do not parse are an error.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::FixedOffset;

use crate::error::{ConfigError, ConfigResult};
use crate::source::{
    SheetsApiSource, SheetsAuth, SnapshotSource, TabularSource, DEFAULT_SHEETS_BASE_URL, DEFAULT_SNAPSHOT_ID,
};
use crate::transform::dates::offset_from_hours;
use crate::transform::pipeline::{DashboardService, TransformSettings, DEFAULT_UTC_OFFSET_HOURS};
use crate::transform::stages::ActivityRule;

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub sheet_id: Option<String>,
    pub sheets_auth: Option<SheetsAuth>,
    pub sheets_base_url: String,
    pub snapshot_dir: Option<PathBuf>,
    pub offset: FixedOffset,
    pub activity: ActivityRule,
    pub excluded_tabs: Vec<String>,
    pub port: u16,
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn env_string<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<F, T>(lookup: &F, name: &str, reason: &str) -> ConfigResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match env_string(lookup, name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(name, &raw, reason)),
        None => Ok(None),
    }
}

fn env_list<F>(lookup: &F, name: &str) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    env_string(lookup, name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Read the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through `lookup`, so callers and tests can supply
    /// their own variables.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hours: i32 = env_parsed(&lookup, "DASHBOARD_UTC_OFFSET_HOURS", "expected whole hours")?
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);
        let offset = offset_from_hours(hours).ok_or_else(|| {
            invalid("DASHBOARD_UTC_OFFSET_HOURS", &hours.to_string(), "must be between -23 and 23")
        })?;

        let activity = env_parsed(&lookup, "DASHBOARD_ACTIVE_WITHIN_DAYS", "expected a day count")?
            .map_or(ActivityRule::Always, |days| ActivityRule::UpdatedWithinDays { days });

        let port = env_parsed(&lookup, "PORT", "expected a TCP port")?.unwrap_or(DEFAULT_PORT);

        let sheets_auth = env_string(&lookup, "GOOGLE_SHEETS_ACCESS_TOKEN")
            .map(SheetsAuth::Bearer)
            .or_else(|| env_string(&lookup, "GOOGLE_SHEETS_API_KEY").map(SheetsAuth::ApiKey));

        Ok(Self {
            sheet_id: env_string(&lookup, "DASHBOARD_SHEET_ID"),
            sheets_auth,
            sheets_base_url: env_string(&lookup, "SHEETS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string()),
            snapshot_dir: env_string(&lookup, "DASHBOARD_SNAPSHOT_DIR").map(PathBuf::from),
            offset,
            activity,
            excluded_tabs: env_list(&lookup, "DASHBOARD_EXCLUDED_TABS"),
            port,
        })
    }

    pub fn settings(&self) -> TransformSettings {
        TransformSettings {
            offset: self.offset,
            activity: self.activity,
            excluded_tabs: self.excluded_tabs.clone(),
        }
    }

    /// Snapshot directory if set, else the Sheets API if credentials exist.
    pub fn build_source(&self) -> Option<Arc<dyn TabularSource>> {
        if let Some(dir) = &self.snapshot_dir {
            return Some(Arc::new(SnapshotSource::new(dir.clone())));
        }
        self.sheets_auth.as_ref().map(|auth| {
            let source = SheetsApiSource::new(auth.clone()).with_base_url(&self.sheets_base_url);
            Arc::new(source) as Arc<dyn TabularSource>
        })
    }

    /// The configured sheet id. A snapshot directory needs none and falls
    /// back to [`DEFAULT_SNAPSHOT_ID`].
    pub fn source_id(&self) -> Option<String> {
        self.sheet_id.clone().or_else(|| {
            self.snapshot_dir
                .as_ref()
                .map(|_| DEFAULT_SNAPSHOT_ID.to_string())
        })
    }

    pub fn service(&self) -> DashboardService {
        DashboardService::new(self.build_source(), self.source_id(), self.settings())
    }
}
