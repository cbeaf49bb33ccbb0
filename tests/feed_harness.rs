//! Feed derivation harness.
//!
//! # What this covers
//!
//! - **Merge length**: before filtering, the merged feed holds every report
//!   from both collections.
//! - **Ordering**: the merged feed is newest first (ties by id), whichever
//!   stream delivers first.
//! - **Idempotent filters**: applying the same filters twice changes nothing.
//! - **Mine scope**: exactly the reports owned by the identity; nothing when
//!   there is no identity.
//! - **Search**: case-insensitive over name and description.
//! - The four feed scenarios: unfiltered, type = found, search = "usb", and
//!   two empty snapshots.
//!
//! # Running
//!
//! ```sh
//! cargo test --test feed_harness
//! ```

mod common;
use common::*;

use cf_core::feed::{apply_filters, derive_feed, matches_search, merge_sorted};
use cf_core::{
    Category, EmptyState, FeedAggregator, FeedFilters, Filter, Identity, ItemReport, ItemType,
    Scope, SourceUpdate,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const OWNERS: [&str; 3] = ["u-ada", "u-bo", "u-cy"];

/// Reports with unique ids, random timestamps (plenty of collisions), random
/// categories and owners. Split by type into (lost, found).
fn arb_inventory() -> impl Strategy<Value = (Vec<ItemReport>, Vec<ItemReport>)> {
    prop::collection::vec(
        (
            0i64..60,
            any::<bool>(),
            0usize..Category::ALL.len(),
            prop::option::of(0usize..OWNERS.len()),
            "[a-zA-Z ]{1,16}",
        ),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (minute, lost, category, owner, name))| {
                let kind = if lost { ItemType::Lost } else { ItemType::Found };
                let mut builder = ReportBuilder::new(&format!("r{i:03}"), kind)
                    .name(&name)
                    .description("left behind somewhere on campus")
                    .category(Category::ALL[category])
                    .created_at(at(minute));
                if let Some(owner) = owner {
                    builder = builder.owner(OWNERS[owner]);
                }
                builder.build()
            })
            .partition(|r| r.kind == ItemType::Lost)
    })
}

fn arb_filters() -> impl Strategy<Value = FeedFilters> {
    (
        prop::option::of(prop::sample::select(ItemType::ALL.to_vec())),
        prop::option::of(prop::sample::select(Category::ALL.to_vec())),
        "[a-zA-Z]{0,3}",
    )
        .prop_map(|(kind, category, search)| FeedFilters {
            scope: Scope::All,
            kind: kind.map_or(Filter::All, Filter::Only),
            category: category.map_or(Filter::All, Filter::Only),
            search,
        })
}

fn is_newest_first(items: &[ItemReport]) -> bool {
    items.windows(2).all(|w| {
        w[0].created_at > w[1].created_at
            || (w[0].created_at == w[1].created_at && w[0].id < w[1].id)
    })
}

proptest! {
    #[test]
    fn merged_feed_keeps_every_report((lost, found) in arb_inventory()) {
        let merged = merge_sorted(&lost, &found);
        prop_assert_eq!(merged.len(), lost.len() + found.len());
    }

    #[test]
    fn feed_is_sorted_whatever_stream_arrives_first((lost, found) in arb_inventory()) {
        let mut lost_first = FeedAggregator::new(None);
        lost_first.apply(SourceUpdate::snapshot(ItemType::Lost, lost.clone()));
        lost_first.apply(SourceUpdate::snapshot(ItemType::Found, found.clone()));

        let mut found_first = FeedAggregator::new(None);
        found_first.apply(SourceUpdate::snapshot(ItemType::Found, found));
        found_first.apply(SourceUpdate::snapshot(ItemType::Lost, lost));

        prop_assert!(is_newest_first(lost_first.feed()));
        prop_assert_eq!(lost_first.feed(), found_first.feed());
    }

    #[test]
    fn filtering_twice_is_filtering_once(
        (lost, found) in arb_inventory(),
        filters in arb_filters(),
    ) {
        let once = derive_feed(&lost, &found, &filters, None);
        let twice = apply_filters(&once, &filters, None);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn mine_is_exactly_the_owned_subset(
        (lost, found) in arb_inventory(),
        owner in 0usize..OWNERS.len(),
    ) {
        let me = Identity::new(OWNERS[owner]);
        let mine = FeedFilters { scope: Scope::Mine, ..FeedFilters::default() };

        let expected: Vec<ItemReport> = merge_sorted(&lost, &found)
            .into_iter()
            .filter(|r| r.user_id.as_deref() == Some(OWNERS[owner]))
            .collect();
        prop_assert_eq!(derive_feed(&lost, &found, &mine, Some(&me)), expected);
        prop_assert!(derive_feed(&lost, &found, &mine, None).is_empty());
    }

    #[test]
    fn search_ignores_case((lost, found) in arb_inventory()) {
        for item in lost.iter().chain(&found) {
            prop_assert!(matches_search(item, &item.item_name.to_uppercase()));
            prop_assert!(matches_search(item, &item.item_name.to_lowercase()));
        }
    }
}

#[test]
fn search_term_matches_lowercase_name() {
    let item = ReportBuilder::new("b1", ItemType::Lost).name("blue backpack").build();
    assert!(matches_search(&item, "BACKPACK"));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

fn scenario_feed(filters: FeedFilters) -> Vec<String> {
    let (lost, found) = scenario_inventory();
    let mut agg = FeedAggregator::new(None);
    agg.apply(SourceUpdate::snapshot(ItemType::Found, found));
    agg.apply(SourceUpdate::snapshot(ItemType::Lost, lost));
    agg.set_filters(filters);
    agg.feed().iter().map(|r| r.id.to_string()).collect()
}

#[test]
fn unfiltered_feed_is_newest_first() {
    assert_eq!(scenario_feed(FeedFilters::default()), ["1", "2"]);
}

#[test]
fn type_filter_keeps_found_reports() {
    let filters = FeedFilters { kind: Filter::Only(ItemType::Found), ..FeedFilters::default() };
    assert_eq!(scenario_feed(filters), ["2"]);
}

#[test]
fn search_finds_usb_drive() {
    let filters = FeedFilters { search: "usb".into(), ..FeedFilters::default() };
    assert_eq!(scenario_feed(filters), ["2"]);
}

#[test]
fn empty_snapshots_finish_loading_with_adjust_filters_message() {
    let mut agg = FeedAggregator::new(None);
    assert!(agg.is_loading());
    assert_eq!(agg.empty_state(), None);

    agg.apply(SourceUpdate::snapshot(ItemType::Lost, Vec::new()));
    assert!(agg.is_loading());

    agg.apply(SourceUpdate::snapshot(ItemType::Found, Vec::new()));
    assert!(!agg.is_loading());
    assert!(agg.feed().is_empty());
    assert_eq!(agg.empty_state(), Some(EmptyState::AdjustFilters));
    assert_eq!(
        EmptyState::AdjustFilters.message(),
        "Try adjusting your filters or check back later."
    );
}

#[test]
fn mine_scope_with_nothing_owned_invites_a_first_report() {
    let (lost, found) = scenario_inventory();
    let mut agg = FeedAggregator::new(Some(Identity::new("u-new")));
    agg.apply(SourceUpdate::snapshot(ItemType::Lost, lost));
    agg.apply(SourceUpdate::snapshot(ItemType::Found, found));
    agg.set_scope(Scope::Mine);

    assert!(agg.feed().is_empty());
    assert_eq!(agg.empty_state(), Some(EmptyState::NoReportsYet));
    assert_eq!(ids(agg.merged()), ["1", "2"]);
}
