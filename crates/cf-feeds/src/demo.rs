//! Demo reports for the in-memory store, spread over the last few days so the
//! feed has something to sort.

use cf_core::{Category, ItemId, ItemReport, ItemType};
use chrono::{DateTime, Duration, Utc};

// (type, name, description, category, location, owner, hours ago)
type Template = (
    ItemType,
    &'static str,
    &'static str,
    Category,
    &'static str,
    Option<&'static str>,
    i64,
);

const REPORTS: &[Template] = &[
    (ItemType::Lost, "Blue Backpack", "Navy blue backpack with a broken front zip and a physics textbook inside", Category::Other, "Library, 2nd Floor", Some("demo-alex"), 2),
    (ItemType::Found, "USB Drive", "32GB silver USB stick on a red lanyard", Category::Electronics, "Computer Lab 3", Some("demo-sam"), 3),
    (ItemType::Found, "Student ID Card", "ID card for a second-year engineering student", Category::IdCard, "Cafeteria entrance", None, 5),
    (ItemType::Lost, "Algebra Textbook", "Linear Algebra and Its Applications, 5th edition, name on first page", Category::Book, "Lecture Hall B", Some("demo-sam"), 9),
    (ItemType::Lost, "Wireless Earbuds", "White earbuds in a charging case with a cat sticker", Category::Electronics, "Gym changing rooms", Some("demo-jordan"), 20),
    (ItemType::Found, "Water Bottle", "Green steel bottle covered in band stickers", Category::Other, "Sports field bleachers", Some("demo-alex"), 26),
    (ItemType::Found, "Chemistry Notes", "Ring binder of organic chemistry notes, colour coded", Category::Book, "Science Building foyer", None, 31),
    (ItemType::Lost, "Laptop Charger", "65W USB-C charger, slightly frayed cable", Category::Electronics, "Study room 4", Some("demo-jordan"), 44),
    (ItemType::Lost, "Library Card", "Blue library card in a clear plastic sleeve", Category::IdCard, "Bus stop outside main gate", Some("demo-alex"), 50),
    (ItemType::Found, "Umbrella", "Black folding umbrella with a wooden handle", Category::Other, "Arts Centre cloakroom", Some("demo-sam"), 70),
];

/// Ten varied reports created relative to `now`.
pub fn demo_reports(now: DateTime<Utc>) -> Vec<ItemReport> {
    REPORTS
        .iter()
        .enumerate()
        .map(|(i, &(kind, name, description, category, location, owner, hours_ago))| {
            let created_at = now - Duration::hours(hours_ago);
            ItemReport {
                id: ItemId(format!("demo-{:02}", i + 1)),
                user_id: owner.map(str::to_string),
                user_email: owner.map(|o| format!("{o}@campus.example")),
                kind,
                item_name: name.to_string(),
                description: description.to_string(),
                location: location.to_string(),
                category,
                date: (created_at - Duration::hours(6)).date_naive(),
                image_url: None,
                created_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_data_covers_both_types_and_every_category() {
        let reports = demo_reports(Utc::now());
        assert_eq!(reports.len(), REPORTS.len());
        for kind in ItemType::ALL {
            assert!(reports.iter().any(|r| r.kind == kind));
        }
        for category in Category::ALL {
            assert!(reports.iter().any(|r| r.category == category));
        }
        assert!(reports.iter().any(|r| r.user_id.is_none()));
    }
}
