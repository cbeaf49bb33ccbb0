//! Core types for cf-core.
//!
//! This module defines the data structures shared across all layers: the
//! [`ItemReport`] document, its [`ItemType`] and [`Category`] tags, the
//! [`Identity`] of the current user, and the view parameters ([`Scope`],
//! [`Filter`]) that drive the feed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Opaque report identifier assigned by the store at creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}

/// A lost-or-found report as stored in one of the two collections.
///
/// Field names serialize in camelCase (`itemName`, `createdAt`, ...) so the
/// documents read the same regardless of which store produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub id: ItemId,
    /// Reporter uid; `None` for anonymous submissions.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// Immutable; selects the backing collection.
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub item_name: String,
    pub description: String,
    pub location: String,
    pub category: Category,
    /// Calendar date the item was lost or found (domain data, never a sort key).
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Assigned by the store; the canonical feed ordering key.
    pub created_at: DateTime<Utc>,
}

impl ItemReport {
    /// True when `identity` is the reporter of this item.
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.user_id.as_deref() == Some(identity.uid.as_str())
    }
}

/// Whether a report describes a lost or a found item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Lost,
    Found,
}

impl ItemType {
    pub const ALL: [ItemType; 2] = [ItemType::Lost, ItemType::Found];

    /// Name of the collection that holds reports of this type.
    pub fn collection(self) -> &'static str {
        match self {
            ItemType::Lost => "lostItems",
            ItemType::Found => "foundItems",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Lost => write!(f, "lost"),
            ItemType::Found => write!(f, "found"),
        }
    }
}

impl FromStr for ItemType {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lost" => Ok(ItemType::Lost),
            "found" => Ok(ItemType::Found),
            other => Err(ParseFilterError::UnknownType(other.to_string())),
        }
    }
}

/// Report category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    #[serde(rename = "ID Card")]
    IdCard,
    Book,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::IdCard,
        Category::Book,
        Category::Other,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Electronics => write!(f, "Electronics"),
            Category::IdCard => write!(f, "ID Card"),
            Category::Book => write!(f, "Book"),
            Category::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for Category {
    type Err = ParseFilterError;

    /// Accepts the display names case-insensitively plus the short forms
    /// `id`, `idcard` and `id-card`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "electronics" => Ok(Category::Electronics),
            "id card" | "id" | "idcard" | "id-card" | "id_card" => Ok(Category::IdCard),
            "book" => Ok(Category::Book),
            "other" => Ok(Category::Other),
            other => Err(ParseFilterError::UnknownCategory(other.to_string())),
        }
    }
}

/// The user the dashboard is acting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into(), email: None }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Feed restriction between every report and the current user's own reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    Mine,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Mine => write!(f, "mine"),
        }
    }
}

impl FromStr for Scope {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Scope::All),
            "mine" | "my" | "my-reports" => Ok(Scope::Mine),
            other => Err(ParseFilterError::UnknownScope(other.to_string())),
        }
    }
}

/// A tag filter: either everything passes, or only one value does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }
}

impl<T: Copy + PartialEq> Filter<T> {
    /// Step to the next value in `order`, wrapping through `All`.
    ///
    /// `All → order[0] → order[1] → … → All`.
    pub fn cycle(self, order: &[T]) -> Self {
        match self {
            Filter::All => order.first().copied().map_or(Filter::All, Filter::Only),
            Filter::Only(current) => {
                let pos = order.iter().position(|v| *v == current);
                match pos.and_then(|i| order.get(i + 1)) {
                    Some(next) => Filter::Only(*next),
                    None => Filter::All,
                }
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Only(v) => write!(f, "{v}"),
        }
    }
}

impl<T: FromStr<Err = ParseFilterError>> FromStr for Filter<T> {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse().map(Filter::Only)
        }
    }
}

pub type TypeFilter = Filter<ItemType>;
pub type CategoryFilter = Filter<Category>;

/// Error returned when a type, category or scope name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFilterError {
    #[error("unknown type '{0}' (expected all, lost or found)")]
    UnknownType(String),
    #[error("unknown category '{0}' (expected all, electronics, id, book or other)")]
    UnknownCategory(String),
    #[error("unknown scope '{0}' (expected all or mine)")]
    UnknownScope(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
