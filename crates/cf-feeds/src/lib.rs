//! cf-feeds — live report sources and stores for CampusFind.
//!
//! A store exposes two live collections (`lostItems`, `foundItems`) through
//! [`LiveQuery`], accepts writes through [`ReportStore`], and keeps report
//! photos in a [`BlobStore`]. [`LiveFeed`] owns one [`Subscription`] per
//! collection and pumps their snapshots into a
//! [`FeedAggregator`](cf_core::FeedAggregator) over a `tokio` channel.
//!
//! Two stores ship here: [`MemoryStore`] (in-process, optionally seeded with
//! demo reports) and [`DirStore`] (JSON documents in a directory, watched with
//! `notify` so several processes share one live feed).

pub mod demo;
pub mod dir;
pub mod live;
pub mod memory;
pub mod subscription;

pub use dir::DirStore;
pub use live::LiveFeed;
pub use memory::MemoryStore;
pub use subscription::Subscription;

use bytes::Bytes;
use cf_core::config::{StoreBackend, StoreConfig};
use cf_core::{Identity, ImageUpload, ItemId, ItemReport, ItemType, NewReport};
use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::path::PathBuf;
use std::sync::Arc;

/// Errors raised by stores and subscriptions.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("report {id} not found in {collection}")]
    NotFound { collection: &'static str, id: ItemId },

    #[error("only the reporter can delete report {0}")]
    NotOwner(ItemId),

    #[error("blob not found: {0}")]
    BlobNotFound(String),

    #[error("blob url {0} does not belong to this store")]
    ForeignBlob(String),

    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Stream of full collection snapshots, newest report first. The first item is
/// the current state; later items follow every change until the stream is
/// dropped.
pub type SnapshotStream = BoxStream<'static, StoreResult<Vec<ItemReport>>>;

/// Standing queries against the two report collections.
pub trait LiveQuery: Send + Sync {
    fn subscribe(&self, collection: ItemType) -> SnapshotStream;
}

/// Writes against the report collections.
pub trait ReportStore: Send + Sync {
    /// Store a validated report, uploading its image first. Returns the new id.
    fn create_report(
        &self,
        report: NewReport,
        owner: Option<Identity>,
    ) -> BoxFuture<'_, StoreResult<ItemId>>;

    /// Remove a report owned by `requester`, then best-effort remove its image.
    fn delete_report(
        &self,
        kind: ItemType,
        id: ItemId,
        requester: Identity,
    ) -> BoxFuture<'_, StoreResult<()>>;
}

/// Photo storage. URLs returned by [`BlobStore::put`] are what
/// [`ItemReport::image_url`] records.
pub trait BlobStore: Send + Sync {
    fn put(&self, key: String, data: Bytes, content_type: String)
        -> BoxFuture<'_, StoreResult<String>>;

    fn delete(&self, url: String) -> BoxFuture<'_, StoreResult<()>>;
}

/// A complete backend: live reads plus writes. Constructed once at startup and
/// shared as `Arc<dyn Backend>`.
pub trait Backend: LiveQuery + ReportStore {}

impl<T: LiveQuery + ReportStore> Backend for T {}

/// Open the backend selected by `[store]`.
pub fn open_backend(config: &StoreConfig) -> StoreResult<Arc<dyn Backend>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory store with demo reports");
            Ok(Arc::new(MemoryStore::with_demo_data()))
        }
        StoreBackend::Dir => {
            let root = config.data_dir();
            tracing::info!(root = %root.display(), "using directory store");
            Ok(Arc::new(DirStore::open(root)?))
        }
    }
}

// ---------------------------------------------------------------------------
// Shared write helpers
// ---------------------------------------------------------------------------

/// Blob key for an uploaded photo: `items/{uid|anonymous}/{unix_millis}_{file}`.
pub fn image_key(owner: Option<&Identity>, file_name: &str, now: DateTime<Utc>) -> String {
    let uid = owner.map_or("anonymous", |o| o.uid.as_str());
    // Only the final path component of the upload's name is kept.
    let base = file_name
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(file_name);
    format!(
        "items/{}/{}_{}",
        sanitize_segment(uid),
        now.timestamp_millis(),
        sanitize_segment(base)
    )
}

fn sanitize_segment(s: &str) -> String {
    let cleaned = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace("..", "__");
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Creation timestamp strictly after every timestamp already in the store.
pub fn next_created_at(now: DateTime<Utc>, latest: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match latest {
        Some(latest) if latest >= now => latest + Duration::microseconds(1),
        _ => now,
    }
}

/// Upload the report's image, if any, and return its URL.
pub(crate) async fn upload_image<B: BlobStore + ?Sized>(
    blobs: &B,
    owner: Option<&Identity>,
    image: Option<ImageUpload>,
    now: DateTime<Utc>,
) -> StoreResult<Option<String>> {
    let Some(image) = image else {
        return Ok(None);
    };
    let key = image_key(owner, &image.file_name, now);
    let url = blobs.put(key, image.data, image.content_type).await?;
    Ok(Some(url))
}

/// Remove a deleted report's image, logging instead of failing.
pub(crate) async fn delete_image_best_effort<B: BlobStore + ?Sized>(
    blobs: &B,
    report: &ItemReport,
) {
    if let Some(url) = &report.image_url {
        if let Err(e) = blobs.delete(url.clone()).await {
            tracing::warn!(id = %report.id, url = %url, error = %e, "image cleanup failed");
        }
    }
}

/// Assemble the stored document for a validated report.
pub(crate) fn build_report(
    id: ItemId,
    report: NewReport,
    owner: Option<&Identity>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
) -> ItemReport {
    ItemReport {
        id,
        user_id: owner.map(|o| o.uid.clone()),
        user_email: owner.and_then(|o| o.email.clone()),
        kind: report.kind,
        item_name: report.item_name,
        description: report.description,
        location: report.location,
        category: report.category,
        date: report.date,
        image_url,
        created_at,
    }
}

pub(crate) fn new_id() -> ItemId {
    ItemId(uuid::Uuid::new_v4().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
