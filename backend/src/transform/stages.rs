//! Conversion rates, health score, and the activity rule.
//!
//! Rates are always computed from the stage list they describe; callers that
//! filter or rename stages go through [`Role`](crate::models::Role) methods
//! which call back in here.

use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dates::parse_slash;
use crate::models::{ConversionRate, FunnelStage};

/// Rates strictly below this percentage are flagged `isLow`.
pub const LOW_CONVERSION_THRESHOLD: f64 = 30.0;

/// One rate per adjacent stage pair, in stage order.
pub fn conversion_rates(stages: &[FunnelStage]) -> Vec<ConversionRate> {
    stages
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            let rate = percentage(curr.candidate_count, prev.candidate_count);
            ConversionRate {
                from_stage: prev.stage_name.clone(),
                to_stage: curr.stage_name.clone(),
                rate,
                is_low: rate < LOW_CONVERSION_THRESHOLD,
            }
        })
        .collect()
}

/// Last stage count as a percentage of the first (0 when the first is 0).
pub fn health_score(stages: &[FunnelStage]) -> f64 {
    match (stages.first(), stages.last()) {
        (Some(first), Some(last)) => percentage(last.candidate_count, first.candidate_count),
        _ => 0.0,
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// Decides `isActive` for a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityRule {
    /// Every role is active.
    #[default]
    Always,
    /// Active when `lastUpdated` (MM/DD/YYYY) is at most `days` before today.
    UpdatedWithinDays { days: u32 },
}

impl ActivityRule {
    pub fn is_active(&self, last_updated: &str, today: NaiveDate) -> bool {
        match self {
            ActivityRule::Always => true,
            ActivityRule::UpdatedWithinDays { days } => parse_slash(last_updated)
                .map(|ts| {
                    let age = (today - ts.date()).num_days();
                    (0..=i64::from(*days)).contains(&age)
                })
                .unwrap_or(false),
        }
    }
}

/// Today's date in the given fixed offset.
pub fn today_in(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}
