//! Report form validation.
//!
//! A [`ReportDraft`] holds exactly what the user typed. [`ReportDraft::validate`]
//! either produces a [`NewReport`] ready for the store or a [`ValidationErrors`]
//! with one message per offending field, so the form can render them inline.

use crate::types::{Category, ItemType};
use bytes::Bytes;
use chrono::NaiveDate;
use std::fmt;

pub const ITEM_NAME_MIN: usize = 2;
pub const ITEM_NAME_MAX: usize = 50;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 500;
pub const LOCATION_MIN: usize = 3;

/// Earliest date the form accepts.
pub fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// A photo attached to a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    /// Build an upload, guessing the content type from the file extension.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self { file_name, content_type, data: data.into() }
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Raw form input, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub kind: Option<ItemType>,
    pub item_name: String,
    pub description: String,
    pub category: Option<Category>,
    pub location: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub image: Option<ImageUpload>,
}

/// A validated report, ready to hand to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub kind: ItemType,
    pub item_name: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub date: NaiveDate,
    pub image: Option<ImageUpload>,
}

/// Form fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Kind,
    ItemName,
    Description,
    Category,
    Location,
    Date,
    Image,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Kind,
        Field::ItemName,
        Field::Description,
        Field::Category,
        Field::Location,
        Field::Date,
        Field::Image,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Kind => "Report type",
            Field::ItemName => "Item name",
            Field::Description => "Description",
            Field::Category => "Category",
            Field::Location => "Location",
            Field::Date => "Date lost/found",
            Field::Image => "Image (optional)",
        }
    }
}

/// Per-field validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(Field, String)>,
}

impl std::error::Error for ValidationErrors {}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, msg)| format!("{}: {}", field.label(), msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        // First failure per field wins.
        if self.get(field).is_none() {
            self.errors.push((field, message.into()));
        }
    }

    /// Message for `field`, if it failed.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

impl ReportDraft {
    /// Check every rule against `today` and collect all failures.
    pub fn validate(&self, today: NaiveDate) -> Result<NewReport, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.kind.is_none() {
            errors.push(Field::Kind, "You must select a report type.");
        }

        let item_name = self.item_name.trim();
        let len = item_name.chars().count();
        if len < ITEM_NAME_MIN {
            errors.push(Field::ItemName, "Item name must be at least 2 characters.");
        } else if len > ITEM_NAME_MAX {
            errors.push(Field::ItemName, "Item name must be at most 50 characters.");
        }

        let description = self.description.trim();
        let len = description.chars().count();
        if len < DESCRIPTION_MIN {
            errors.push(Field::Description, "Description must be at least 10 characters.");
        } else if len > DESCRIPTION_MAX {
            errors.push(Field::Description, "Description must be at most 500 characters.");
        }

        if self.category.is_none() {
            errors.push(Field::Category, "Select a category.");
        }

        let location = self.location.trim();
        if location.chars().count() < LOCATION_MIN {
            errors.push(Field::Location, "Location is required.");
        }

        let date = if self.date.trim().is_empty() {
            errors.push(Field::Date, "A date is required.");
            None
        } else {
            match parse_date(&self.date) {
                None => {
                    errors.push(Field::Date, "Enter a date as YYYY-MM-DD.");
                    None
                }
                Some(d) if d > today || d < earliest_date() => {
                    errors.push(Field::Date, "Date must be between 1900-01-01 and today.");
                    None
                }
                Some(d) => Some(d),
            }
        };

        if let Some(image) = &self.image {
            if image.file_name.trim().is_empty() {
                errors.push(Field::Image, "Image file needs a name.");
            }
        }

        match (self.kind, self.category, date) {
            (Some(kind), Some(category), Some(date)) if errors.is_empty() => Ok(NewReport {
                kind,
                item_name: item_name.to_string(),
                description: description.to_string(),
                category,
                location: location.to_string(),
                date,
                image: self.image.clone(),
            }),
            _ => Err(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
