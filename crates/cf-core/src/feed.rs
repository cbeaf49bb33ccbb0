//! Feed derivation — pure functions from (two snapshots, view parameters) to
//! the rendered list of reports.
//!
//! Nothing in here holds state. [`FeedAggregator`](crate::aggregator::FeedAggregator)
//! memoizes the merged list and calls back into these functions whenever a
//! snapshot or a filter changes.

use crate::types::{CategoryFilter, Identity, ItemReport, Scope, TypeFilter};
use std::cmp::Ordering;

/// User-controlled view parameters applied on top of the merged feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilters {
    pub scope: Scope,
    pub kind: TypeFilter,
    pub category: CategoryFilter,
    /// Free text, matched case-insensitively against name and description.
    pub search: String,
}

/// Why the rendered feed is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// "My reports" is selected and the user owns nothing in either collection.
    NoReportsYet,
    /// Anything else: reports exist but the filters exclude them all, or
    /// nobody has reported anything yet.
    AdjustFilters,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoReportsYet => "You haven't reported any items yet.",
            EmptyState::AdjustFilters => "Try adjusting your filters or check back later.",
        }
    }
}

/// Feed order: newest `created_at` first, ties broken by ascending id.
pub fn newest_first(a: &ItemReport, b: &ItemReport) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Merge the two collection snapshots into one feed sorted by [`newest_first`].
///
/// The result does not depend on which argument holds which collection, so
/// the two live streams may deliver in any order.
pub fn merge_sorted(lost: &[ItemReport], found: &[ItemReport]) -> Vec<ItemReport> {
    let mut merged = Vec::with_capacity(lost.len() + found.len());
    merged.extend_from_slice(lost);
    merged.extend_from_slice(found);
    merged.sort_by(newest_first);
    merged
}

/// Case-insensitive substring match against `item_name` or `description`.
///
/// An empty term matches everything.
pub fn matches_search(item: &ItemReport, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    item.item_name.to_lowercase().contains(&needle)
        || item.description.to_lowercase().contains(&needle)
}

/// Apply scope, type, category and search (in that order) to an already
/// merged-and-sorted list.
///
/// `Scope::Mine` without an identity yields nothing.
pub fn apply_filters(
    items: &[ItemReport],
    filters: &FeedFilters,
    identity: Option<&Identity>,
) -> Vec<ItemReport> {
    if filters.scope == Scope::Mine && identity.is_none() {
        return Vec::new();
    }

    items
        .iter()
        .filter(|item| match (filters.scope, identity) {
            (Scope::Mine, Some(me)) => item.is_owned_by(me),
            _ => true,
        })
        .filter(|item| filters.kind.matches(&item.kind))
        .filter(|item| filters.category.matches(&item.category))
        .filter(|item| matches_search(item, &filters.search))
        .cloned()
        .collect()
}

/// Full derivation: merge, sort, filter.
pub fn derive_feed(
    lost: &[ItemReport],
    found: &[ItemReport],
    filters: &FeedFilters,
    identity: Option<&Identity>,
) -> Vec<ItemReport> {
    apply_filters(&merge_sorted(lost, found), filters, identity)
}

/// Pick the empty-feed message for the current view.
pub fn empty_state(
    merged: &[ItemReport],
    filters: &FeedFilters,
    identity: Option<&Identity>,
) -> EmptyState {
    let owns_nothing = match identity {
        Some(me) => !merged.iter().any(|item| item.is_owned_by(me)),
        None => true,
    };
    if filters.scope == Scope::Mine && owns_nothing {
        EmptyState::NoReportsYet
    } else {
        EmptyState::AdjustFilters
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
