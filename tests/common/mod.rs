//! Shared helpers for the CampusFind integration harnesses.
//!
//! Import with `mod common; use common::*;` at the top of a harness file.

#![allow(dead_code)]

pub mod builders;

pub use builders::*;

use cf_core::{ItemReport, ItemType};
use std::time::Duration;

/// The two-report inventory used by the feed scenarios: an older found USB
/// drive and a newer lost algebra textbook.
pub fn scenario_inventory() -> (Vec<ItemReport>, Vec<ItemReport>) {
    let lost = vec![ReportBuilder::new("1", ItemType::Lost)
        .name("Algebra Text")
        .description("Hardback, second edition, name on the cover")
        .category(cf_core::Category::Book)
        .created_at(at(2))
        .build()];
    let found = vec![ReportBuilder::new("2", ItemType::Found)
        .name("USB Drive")
        .description("Blue 32GB stick left in a lab PC")
        .category(cf_core::Category::Electronics)
        .created_at(at(1))
        .build()];
    (lost, found)
}

/// Upper bound for anything a harness waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// Poll `check` until it holds or [`WAIT`] elapses.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
