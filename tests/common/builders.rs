//! Test builders for [`ItemReport`] fixtures.
//!
//! Unset text fields are filled with `fake` data so tests only spell out what
//! they assert on. Builders panic on nonsense input rather than returning
//! `Result`.

use cf_core::{Category, ItemId, ItemReport, ItemType};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use fake::faker::address::en::StreetName;
use fake::faker::lorem::en::{Sentence, Words};
use fake::Fake;

/// `minute` minutes after a fixed reference instant.
pub fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
}

/// Ids of `items`, in order.
pub fn ids(items: &[ItemReport]) -> Vec<&str> {
    items.iter().map(|r| r.id.as_str()).collect()
}

/// Fluent builder for [`ItemReport`].
///
/// ```rust
/// let report = ReportBuilder::new("r1", ItemType::Lost)
///     .name("Blue backpack")
///     .owner("u-1")
///     .created_at(at(5))
///     .build();
/// ```
pub struct ReportBuilder {
    report: ItemReport,
}

impl ReportBuilder {
    pub fn new(id: &str, kind: ItemType) -> Self {
        let words: Vec<String> = Words(2..4).fake();
        Self {
            report: ItemReport {
                id: ItemId::from(id),
                user_id: None,
                user_email: None,
                kind,
                item_name: words.join(" "),
                description: Sentence(4..10).fake(),
                location: StreetName().fake(),
                category: Category::Other,
                date: NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
                image_url: None,
                created_at: at(0),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.report.item_name = name.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.report.description = description.to_string();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.report.category = category;
        self
    }

    pub fn owner(mut self, uid: &str) -> Self {
        self.report.user_id = Some(uid.to_string());
        self.report.user_email = Some(format!("{uid}@campus.test"));
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.report.created_at = created_at;
        self
    }

    pub fn build(self) -> ItemReport {
        self.report
    }
}
