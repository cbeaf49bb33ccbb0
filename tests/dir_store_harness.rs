//! Directory store harness: [`DirStore`] + `notify` + [`LiveFeed`].
//!
//! # What this covers
//!
//! - Two stores opened on one directory (two dashboards) see each other's
//!   writes through their live feeds.
//! - A collection file written by hand is picked up by a running feed.
//! - Concurrent writers on one directory never lose an acknowledged report.
//! - `createdAt` keeps increasing even for back-to-back writes.
//! - Deleting a report removes its photo from the blob directory.
//!
//! # Running
//!
//! ```sh
//! cargo test --test dir_store_harness
//! ```

mod common;
use common::*;

use cf_core::{Category, Identity, ImageUpload, ItemReport, ItemType, NewReport};
use cf_feeds::{DirStore, LiveFeed, ReportStore};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::{runtime::Handle, time::timeout};

fn me() -> Identity {
    Identity::new("u-ada")
}

fn new_report(kind: ItemType, name: &str, image: Option<ImageUpload>) -> NewReport {
    NewReport {
        kind,
        item_name: name.to_string(),
        description: "Left on a bench outside the sports hall".to_string(),
        category: Category::Other,
        location: "Sports Hall".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        image,
    }
}

async fn loaded_feed(store: &DirStore) -> LiveFeed {
    let mut feed = LiveFeed::start(store, &Handle::current(), Some(me()));
    timeout(WAIT, feed.wait_loaded()).await.expect("feed never loaded");
    feed
}

async fn until(feed: &mut LiveFeed, done: impl Fn(&[ItemReport]) -> bool) {
    timeout(WAIT, async {
        while !done(feed.aggregator().feed()) {
            assert!(feed.next_update().await, "streams ended early");
        }
    })
    .await
    .expect("condition never reached");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn writes_reach_every_store_on_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    let first = DirStore::open(dir.path()).unwrap();
    let second = DirStore::open(dir.path()).unwrap();
    let mut first_feed = loaded_feed(&first).await;
    let mut second_feed = loaded_feed(&second).await;
    assert!(first_feed.aggregator().feed().is_empty());

    let lost = second
        .create_report(new_report(ItemType::Lost, "Water bottle", None), Some(me()))
        .await
        .unwrap();
    let found = first
        .create_report(new_report(ItemType::Found, "Scarf", None), None)
        .await
        .unwrap();

    let expected = vec![found.to_string(), lost.to_string()];
    for feed in [&mut first_feed, &mut second_feed] {
        until(feed, |items| items.len() == 2).await;
        let got: Vec<String> = feed.aggregator().feed().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(got, expected);
    }

    first.delete_report(ItemType::Lost, lost, me()).await.unwrap();
    until(&mut second_feed, |items| items.len() == 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hand_written_collection_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    let mut feed = loaded_feed(&store).await;

    let reports = vec![
        ReportBuilder::new("a", ItemType::Found).created_at(at(1)).build(),
        ReportBuilder::new("b", ItemType::Found).owner("u-ada").created_at(at(2)).build(),
    ];
    let json = serde_json::to_vec(&reports).unwrap();
    let tmp = dir.path().join("incoming.tmp");
    std::fs::write(&tmp, json).unwrap();
    std::fs::rename(&tmp, dir.path().join("foundItems.json")).unwrap();

    until(&mut feed, |items| items.len() == 2).await;
    assert_eq!(ids(feed.aggregator().feed()), ["b", "a"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_keep_every_report() {
    let dir = tempfile::tempdir().unwrap();
    let stores = [
        Arc::new(DirStore::open(dir.path()).unwrap()),
        Arc::new(DirStore::open(dir.path()).unwrap()),
    ];

    let mut tasks = Vec::new();
    for i in 0..20 {
        let store = Arc::clone(&stores[i % 2]);
        tasks.push(tokio::spawn(async move {
            store
                .create_report(new_report(ItemType::Lost, &format!("Item {i}"), None), Some(me()))
                .await
        }));
    }
    let mut acknowledged = HashSet::new();
    for task in tasks {
        acknowledged.insert(task.await.unwrap().unwrap().to_string());
    }
    assert_eq!(acknowledged.len(), 20);

    let raw = std::fs::read(dir.path().join("lostItems.json")).unwrap();
    let stored: HashSet<String> = serde_json::from_slice::<Vec<ItemReport>>(&raw)
        .unwrap()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect();
    assert_eq!(stored, acknowledged);
}

#[tokio::test]
async fn created_at_is_strictly_increasing() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();

    for (i, kind) in [ItemType::Lost, ItemType::Found].into_iter().cycle().take(6).enumerate() {
        store
            .create_report(new_report(kind, &format!("Item {i}"), None), Some(me()))
            .await
            .unwrap();
    }

    let mut all = Vec::new();
    for kind in ItemType::ALL {
        let raw = std::fs::read(dir.path().join(format!("{}.json", kind.collection()))).unwrap();
        let items: Vec<ItemReport> = serde_json::from_slice(&raw).unwrap();
        all.extend(items);
    }
    all.sort_by_key(|r| r.created_at);
    let names: Vec<&str> = all.iter().map(|r| r.item_name.as_str()).collect();
    assert_eq!(names, ["Item 0", "Item 1", "Item 2", "Item 3", "Item 4", "Item 5"]);
    assert!(all.windows(2).all(|w| w[0].created_at < w[1].created_at));
}

#[tokio::test]
async fn deleting_a_report_removes_its_photo() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    let image = ImageUpload::new("wallet.png", b"\x89PNG fake".to_vec());

    let id = store
        .create_report(new_report(ItemType::Found, "Wallet", Some(image)), Some(me()))
        .await
        .unwrap();

    let raw = std::fs::read(dir.path().join("foundItems.json")).unwrap();
    let items: Vec<ItemReport> = serde_json::from_slice(&raw).unwrap();
    let url = items[0].image_url.clone().expect("photo url recorded");
    let photo = store.blobs().resolve(&url).unwrap();
    assert!(photo.starts_with(store.root().join("blobs").join("items").join("u-ada")));
    assert_eq!(std::fs::read(&photo).unwrap(), b"\x89PNG fake");

    store.delete_report(ItemType::Found, id, me()).await.unwrap();
    assert!(!photo.exists());
}
