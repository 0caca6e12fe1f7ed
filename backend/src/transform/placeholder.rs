//! Canned dashboard served when the spreadsheet cannot be read.

use crate::models::{FunnelStage, Role};

const SAMPLE_UPDATED: &str = "01/15/2024";

const SAMPLE_ROLES: [(&str, [(&str, u32); 5], &str); 3] = [
    (
        "Engineering - Senior Backend Engineer",
        [("Applied", 120), ("Screening", 45), ("Technical Interview", 18), ("Final Interview", 6), ("Offer", 2)],
        "Sample data: spreadsheet unavailable",
    ),
    (
        "Product - Product Manager",
        [("Applied", 80), ("Screening", 30), ("Case Study", 12), ("Final Interview", 5), ("Offer", 1)],
        "Sample data: spreadsheet unavailable",
    ),
    (
        "Sales - Account Executive",
        [("Applied", 60), ("Screening", 15), ("Role Play", 4), ("Final Interview", 2), ("Offer", 1)],
        "Sample data: spreadsheet unavailable",
    ),
];

/// Sample roles with derived rates, marked active.
pub fn placeholder_roles() -> Vec<Role> {
    SAMPLE_ROLES
        .iter()
        .map(|(name, stages, remarks)| {
            let stages = stages
                .iter()
                .map(|(stage, count)| FunnelStage::new(*stage, *count, SAMPLE_UPDATED))
                .collect();
            Role::new(*name, stages, *remarks, SAMPLE_UPDATED, true)
        })
        .collect()
}
