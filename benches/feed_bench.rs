//! Feed derivation benchmarks.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `merge` | Merging and sorting the two collections at 100/1k/10k reports |
//! | `derive` | Full merge + filter for typical filter combinations |
//! | `aggregator` | One snapshot applied to a loaded aggregator, and one filter change |
//!
//! # Viewing results
//!
//! ```sh
//! cargo bench --bench feed_bench
//! open target/criterion/report/index.html
//! ```

use cf_core::feed::{derive_feed, merge_sorted};
use cf_core::{
    Category, FeedAggregator, FeedFilters, Filter, Identity, ItemId, ItemReport, ItemType, Scope,
    SourceUpdate,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

const NAMES: [&str; 6] = [
    "Blue backpack",
    "USB drive",
    "Algebra textbook",
    "Student ID card",
    "Laptop charger",
    "Umbrella",
];

/// `n` reports split across both collections, with a few owners and plenty of
/// equal timestamps.
fn inventory(n: usize) -> (Vec<ItemReport>, Vec<ItemReport>) {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| ItemReport {
            id: ItemId(format!("r{i:06}")),
            user_id: (i % 3 != 0).then(|| format!("u-{}", i % 7)),
            user_email: None,
            kind: if i % 2 == 0 { ItemType::Lost } else { ItemType::Found },
            item_name: NAMES[i % NAMES.len()].to_string(),
            description: format!("Report number {i}, last seen near building {}", i % 12),
            location: "Library".to_string(),
            category: Category::ALL[i % Category::ALL.len()],
            date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            image_url: None,
            created_at: base + Duration::seconds((i / 2) as i64),
        })
        .partition(|r| r.kind == ItemType::Lost)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

fn merge_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for n in [100usize, 1_000, 10_000] {
        let (lost, found) = inventory(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("merge_sorted", n), &n, |b, _| {
            b.iter(|| merge_sorted(black_box(&lost), black_box(&found)))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Derive
// ---------------------------------------------------------------------------

fn derive_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive");
    let (lost, found) = inventory(10_000);
    let me = Identity::new("u-3");

    let cases = [
        ("unfiltered", FeedFilters::default()),
        (
            "type_and_category",
            FeedFilters {
                kind: Filter::Only(ItemType::Found),
                category: Filter::Only(Category::Electronics),
                ..FeedFilters::default()
            },
        ),
        ("search", FeedFilters { search: "BACKPACK".into(), ..FeedFilters::default() }),
        ("mine", FeedFilters { scope: Scope::Mine, ..FeedFilters::default() }),
    ];

    group.throughput(Throughput::Elements(10_000));
    for (name, filters) in cases {
        group.bench_function(name, |b| {
            b.iter(|| derive_feed(black_box(&lost), black_box(&found), &filters, Some(&me)))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

fn aggregator_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregator");
    let (lost, found) = inventory(10_000);

    let mut loaded = FeedAggregator::new(Some(Identity::new("u-3")));
    loaded.apply(SourceUpdate::snapshot(ItemType::Lost, lost.clone()));
    loaded.apply(SourceUpdate::snapshot(ItemType::Found, found));

    group.bench_function("apply_snapshot_10k", |b| {
        b.iter(|| loaded.apply(SourceUpdate::snapshot(ItemType::Lost, black_box(lost.clone()))))
    });

    let mut toggle = false;
    group.bench_function("search_change_10k", |b| {
        b.iter(|| {
            toggle = !toggle;
            loaded.set_search(if toggle { "usb" } else { "" });
        })
    });

    group.finish();
}

criterion_group!(benches, merge_bench, derive_bench, aggregator_bench);
criterion_main!(benches);
