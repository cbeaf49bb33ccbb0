//! Live feed aggregator — the state machine that turns two independently
//! updating collection snapshots into one rendered feed.
//!
//! # State transitions
//!
//! | Input | Effect |
//! |-------|--------|
//! | snapshot from one stream | replace that stream's list, rebuild merged list, re-filter |
//! | error from one stream | keep last-known list, clear loading |
//! | scope / type / category / search change | re-filter the memoized merged list |
//! | identity change | re-filter |
//!
//! Loading clears once both streams have delivered (snapshot or error), or as
//! soon as either stream reports an error, and never comes back.

use crate::feed::{self, EmptyState, FeedFilters};
use crate::types::{CategoryFilter, Identity, ItemReport, ItemType, Scope, TypeFilter};

/// One event from a live collection subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// A full result set, most recently created first.
    Snapshot(Vec<ItemReport>),
    /// The subscription reported an error; the message is for logs only.
    Failed(String),
}

/// A [`SourceEvent`] tagged with the collection that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUpdate {
    pub source: ItemType,
    pub event: SourceEvent,
}

impl SourceUpdate {
    pub fn snapshot(source: ItemType, items: Vec<ItemReport>) -> Self {
        Self { source, event: SourceEvent::Snapshot(items) }
    }

    pub fn failed(source: ItemType, message: impl Into<String>) -> Self {
        Self { source, event: SourceEvent::Failed(message.into()) }
    }
}

#[derive(Debug, Default)]
struct SourceState {
    items: Vec<ItemReport>,
    delivered: bool,
}

/// Aggregated, filtered view over the lost and found collections.
#[derive(Debug, Default)]
pub struct FeedAggregator {
    lost: SourceState,
    found: SourceState,
    /// `lost ∪ found`, sorted newest first. Rebuilt only when a stream delivers.
    merged: Vec<ItemReport>,
    filters: FeedFilters,
    identity: Option<Identity>,
    loaded: bool,
    /// The rendered feed.
    feed: Vec<ItemReport>,
}

impl FeedAggregator {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity, ..Default::default() }
    }

    /// Apply one update from either stream.
    pub fn apply(&mut self, update: SourceUpdate) {
        let SourceUpdate { source, event } = update;
        let state = match source {
            ItemType::Lost => &mut self.lost,
            ItemType::Found => &mut self.found,
        };
        state.delivered = true;

        match event {
            SourceEvent::Snapshot(items) => {
                tracing::debug!(
                    collection = source.collection(),
                    count = items.len(),
                    "snapshot received"
                );
                state.items = items;
                if self.lost.delivered && self.found.delivered {
                    self.loaded = true;
                }
                self.merged = feed::merge_sorted(&self.lost.items, &self.found.items);
                self.refilter();
            }
            SourceEvent::Failed(message) => {
                tracing::warn!(
                    collection = source.collection(),
                    error = %message,
                    "subscription error, keeping last snapshot"
                );
                self.loaded = true;
            }
        }
    }

    pub fn set_scope(&mut self, scope: Scope) {
        if self.filters.scope != scope {
            tracing::debug!(%scope, "feed: scope changed");
            self.filters.scope = scope;
            self.refilter();
        }
    }

    pub fn set_type_filter(&mut self, kind: TypeFilter) {
        if self.filters.kind != kind {
            tracing::debug!(%kind, "feed: type filter changed");
            self.filters.kind = kind;
            self.refilter();
        }
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        if self.filters.category != category {
            tracing::debug!(%category, "feed: category filter changed");
            self.filters.category = category;
            self.refilter();
        }
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if self.filters.search != term {
            tracing::debug!(search = %term, "feed: search changed");
            self.filters.search = term;
            self.refilter();
        }
    }

    /// Replace every filter at once.
    pub fn set_filters(&mut self, filters: FeedFilters) {
        if self.filters != filters {
            self.filters = filters;
            self.refilter();
        }
    }

    pub fn set_identity(&mut self, identity: Option<Identity>) {
        if self.identity != identity {
            self.identity = identity;
            self.refilter();
        }
    }

    fn refilter(&mut self) {
        self.feed = feed::apply_filters(&self.merged, &self.filters, self.identity.as_ref());
    }

    /// True until both streams have delivered, or either has failed.
    pub fn is_loading(&self) -> bool {
        !self.loaded
    }

    /// The rendered feed.
    pub fn feed(&self) -> &[ItemReport] {
        &self.feed
    }

    /// Every known report, unfiltered, newest first.
    pub fn merged(&self) -> &[ItemReport] {
        &self.merged
    }

    pub fn filters(&self) -> &FeedFilters {
        &self.filters
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Message to show when the feed is empty; `None` while loading or when
    /// there is something to show.
    pub fn empty_state(&self) -> Option<EmptyState> {
        if self.is_loading() || !self.feed.is_empty() {
            return None;
        }
        Some(feed::empty_state(&self.merged, &self.filters, self.identity.as_ref()))
    }

    /// Look up a report anywhere in the merged list.
    pub fn find(&self, id: &crate::types::ItemId) -> Option<&ItemReport> {
        self.merged.iter().find(|item| &item.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
