//! Transformation module.
//!
//! Turns a [`Workbook`](crate::models::Workbook) snapshot into dashboard records:
//! - headers / decode / dates: column resolution and cell decoding
//! - extract: declarative extraction plans with optional latest-per-key grouping
//! - stages: conversion rates, health score, activity
//! - tabs / dashboard / updates: tab selection and the three extraction modes
//! - pipeline: per-request orchestration with placeholder fallback

pub mod dashboard;
pub mod dates;
pub mod decode;
pub mod extract;
pub mod headers;
pub mod pipeline;
pub mod placeholder;
pub mod stages;
pub mod tabs;
pub mod updates;

pub use dashboard::{build_roles, DashboardMode, RoleContext};
pub use dates::DateWindow;
pub use extract::{extract, ExtractionPlan, Grouping};
pub use headers::{resolve, ColumnMap, FieldSpec, Matcher, NOT_FOUND};
pub use pipeline::*;
pub use placeholder::placeholder_roles;
pub use stages::ActivityRule;
pub use updates::{daily_updates, key_wins, DailyUpdateFilters};
