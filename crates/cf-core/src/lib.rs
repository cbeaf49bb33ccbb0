//! cf-core — CampusFind core library.
//!
//! This crate holds everything that does not talk to a store or a terminal:
//! the shared domain types, the pure feed derivation, the aggregator state
//! machine that sits on top of it, report validation and configuration.
//!
//! # Data flow
//!
//! ```text
//! lostItems  ──┐
//!              ├──► FeedAggregator ──► merge + sort ──► filter ──► feed
//! foundItems ──┘          ▲
//!                         └── scope / type / category / search
//! ```
//!
//! Subscriptions live in `cf-feeds`; they hand [`SourceUpdate`]s to the
//! aggregator over a `tokio` channel. The UI drives the main thread.

pub mod aggregator;
pub mod config;
pub mod feed;
pub mod types;
pub mod validation;

pub use aggregator::{FeedAggregator, SourceEvent, SourceUpdate};
pub use feed::{EmptyState, FeedFilters};
pub use types::{
    Category, CategoryFilter, Filter, Identity, ItemId, ItemReport, ItemType, Scope, TypeFilter,
};
pub use validation::{ImageUpload, NewReport, ReportDraft, ValidationErrors};
