//! In-process store. Each collection is the value of a `tokio::sync::watch`
//! channel, so every write is a new snapshot for every subscriber.

use crate::{
    build_report, delete_image_best_effort, new_id, next_created_at, upload_image, BlobStore,
    LiveQuery, ReportStore, SnapshotStream, StoreError, StoreResult,
};
use bytes::Bytes;
use cf_core::{feed::newest_first, Identity, ItemId, ItemReport, ItemType, NewReport};
use futures::{future::BoxFuture, stream, FutureExt, StreamExt};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::watch;

const URL_SCHEME: &str = "memory://";

pub struct MemoryStore {
    lost: watch::Sender<Vec<ItemReport>>,
    found: watch::Sender<Vec<ItemReport>>,
    blobs: Arc<MemoryBlobs>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_reports(Vec::new())
    }

    /// Seed both collections; each report lands in the collection of its type.
    pub fn with_reports(reports: Vec<ItemReport>) -> Self {
        let (mut lost, mut found): (Vec<_>, Vec<_>) =
            reports.into_iter().partition(|r| r.kind == ItemType::Lost);
        lost.sort_by(newest_first);
        found.sort_by(newest_first);
        Self {
            lost: watch::Sender::new(lost),
            found: watch::Sender::new(found),
            blobs: Arc::new(MemoryBlobs::default()),
        }
    }

    /// Seeded with [`crate::demo::demo_reports`].
    pub fn with_demo_data() -> Self {
        Self::with_reports(crate::demo::demo_reports(chrono::Utc::now()))
    }

    fn collection(&self, kind: ItemType) -> &watch::Sender<Vec<ItemReport>> {
        match kind {
            ItemType::Lost => &self.lost,
            ItemType::Found => &self.found,
        }
    }

    /// Current contents of one collection.
    pub fn snapshot(&self, kind: ItemType) -> Vec<ItemReport> {
        self.collection(kind).borrow().clone()
    }

    /// Live subscriber count for one collection.
    pub fn subscriber_count(&self, kind: ItemType) -> usize {
        self.collection(kind).receiver_count()
    }

    pub fn blobs(&self) -> &MemoryBlobs {
        &self.blobs
    }

    fn latest_created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        ItemType::ALL
            .iter()
            .filter_map(|&k| self.collection(k).borrow().iter().map(|r| r.created_at).max())
            .max()
    }
}

impl LiveQuery for MemoryStore {
    fn subscribe(&self, collection: ItemType) -> SnapshotStream {
        let rx = self.collection(collection).subscribe();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let snapshot = rx.borrow_and_update().clone();
            Some((Ok(snapshot), (rx, false)))
        })
        .boxed()
    }
}

impl ReportStore for MemoryStore {
    fn create_report(
        &self,
        report: NewReport,
        owner: Option<Identity>,
    ) -> BoxFuture<'_, StoreResult<ItemId>> {
        async move {
            let now = chrono::Utc::now();
            let mut report = report;
            let image = report.image.take();
            let image_url = upload_image(self.blobs.as_ref(), owner.as_ref(), image, now).await?;

            let id = new_id();
            let kind = report.kind;
            let created_at = next_created_at(now, self.latest_created_at());
            let doc = build_report(id.clone(), report, owner.as_ref(), image_url, created_at);
            self.collection(kind).send_modify(|items| {
                items.insert(0, doc);
                items.sort_by(newest_first);
            });
            tracing::info!(collection = kind.collection(), %id, "report created");
            Ok(id)
        }
        .boxed()
    }

    fn delete_report(
        &self,
        kind: ItemType,
        id: ItemId,
        requester: Identity,
    ) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            let mut outcome: StoreResult<ItemReport> = Err(StoreError::NotFound {
                collection: kind.collection(),
                id: id.clone(),
            });
            self.collection(kind).send_if_modified(|items| {
                match items.iter().position(|r| r.id == id) {
                    None => false,
                    Some(pos) if !items[pos].is_owned_by(&requester) => {
                        outcome = Err(StoreError::NotOwner(id.clone()));
                        false
                    }
                    Some(pos) => {
                        outcome = Ok(items.remove(pos));
                        true
                    }
                }
            });

            let removed = outcome?;
            tracing::info!(collection = kind.collection(), %id, "report deleted");
            delete_image_best_effort(self.blobs.as_ref(), &removed).await;
            Ok(())
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Blobs
// ---------------------------------------------------------------------------

/// Photo bytes keyed by blob key; URLs are `memory://{key}`.
#[derive(Default)]
pub struct MemoryBlobs {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl MemoryBlobs {
    pub fn contains(&self, url: &str) -> bool {
        let Some(key) = url.strip_prefix(URL_SCHEME) else {
            return false;
        };
        self.objects
            .lock()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobs {
    fn put(
        &self,
        key: String,
        data: Bytes,
        content_type: String,
    ) -> BoxFuture<'_, StoreResult<String>> {
        async move {
            let url = format!("{URL_SCHEME}{key}");
            self.objects
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .insert(key, (data, content_type));
            Ok(url)
        }
        .boxed()
    }

    fn delete(&self, url: String) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            let key = url
                .strip_prefix(URL_SCHEME)
                .ok_or_else(|| StoreError::ForeignBlob(url.clone()))?;
            self.objects
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| StoreError::BlobNotFound(url.clone()))
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
