//! Directory store. Each collection is a JSON array in its own file:
//!
//! ```text
//! <root>/lostItems.json
//! <root>/foundItems.json
//! <root>/blobs/items/<uid>/<millis>_<file>
//! ```
//!
//! Writes replace a collection file atomically (temp file + rename) while
//! holding an exclusive `flock` on `<root>/.lock`, so stores in other
//! processes sharing the directory never interleave their read-modify-write.
//! Subscriptions watch the root directory with `notify`, so a report written
//! by another process shows up in every open dashboard.

use crate::{
    build_report, delete_image_best_effort, new_id, next_created_at, upload_image, BlobStore,
    LiveQuery, ReportStore, SnapshotStream, StoreError, StoreResult,
};
use bytes::Bytes;
use cf_core::{feed::newest_first, Identity, ItemId, ItemReport, ItemType, NewReport};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use futures::{future::BoxFuture, stream, FutureExt, StreamExt};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};
use tokio::sync::{mpsc, Mutex, MutexGuard};

const BLOB_DIR: &str = "blobs";
const LOCK_FILE: &str = ".lock";
const URL_SCHEME: &str = "file://";

pub struct DirStore {
    root: PathBuf,
    write_lock: Mutex<()>,
    blobs: DirBlobs,
}

impl DirStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(BLOB_DIR))?;
        let root = root.canonicalize()?;
        for kind in ItemType::ALL {
            let path = collection_path(&root, kind);
            if !path.exists() {
                std::fs::write(&path, "[]\n")?;
            }
        }
        tracing::debug!(root = %root.display(), "directory store opened");
        Ok(Self {
            blobs: DirBlobs { root: root.join(BLOB_DIR) },
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blobs(&self) -> &DirBlobs {
        &self.blobs
    }

    fn path(&self, kind: ItemType) -> PathBuf {
        collection_path(&self.root, kind)
    }

    /// Serialize writers: first within this process, then across every
    /// process that has the directory open.
    async fn lock_for_write(&self) -> StoreResult<WriteGuard<'_>> {
        let local = self.write_lock.lock().await;
        let path = self.root.join(LOCK_FILE);
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)?;
            // fs2's blocking flock, not the std method of the same name.
            FileExt::lock_exclusive(&file)?;
            Ok(file)
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(WriteGuard { _file: file, _local: local })
    }

    async fn insert_report(
        &self,
        report: NewReport,
        owner: Option<&Identity>,
        image_url: Option<String>,
        now: DateTime<Utc>,
    ) -> StoreResult<ItemId> {
        let _guard = self.lock_for_write().await?;
        let kind = report.kind;
        let mut latest = None;
        for k in ItemType::ALL {
            let newest = read_collection(&self.path(k)).await?.first().map(|r| r.created_at);
            latest = latest.max(newest);
        }
        let path = self.path(kind);
        let mut items = read_collection(&path).await?;

        let id = new_id();
        let created_at = next_created_at(now, latest);
        items.insert(0, build_report(id.clone(), report, owner, image_url, created_at));
        write_collection(&path, &items).await?;
        tracing::info!(collection = kind.collection(), %id, "report created");
        Ok(id)
    }
}

/// The file lock is released when `_file` closes, before the local mutex.
struct WriteGuard<'a> {
    _file: File,
    _local: MutexGuard<'a, ()>,
}

fn collection_path(root: &Path, kind: ItemType) -> PathBuf {
    root.join(format!("{}.json", kind.collection()))
}

/// Read one collection, newest first. A missing file is an empty collection.
async fn read_collection(path: &Path) -> StoreResult<Vec<ItemReport>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut items: Vec<ItemReport> =
        serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    items.sort_by(newest_first);
    Ok(items)
}

async fn write_collection(path: &Path, items: &[ItemReport]) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, json).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

impl LiveQuery for DirStore {
    fn subscribe(&self, collection: ItemType) -> SnapshotStream {
        let path = self.path(collection);
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let target: Option<OsString> = path.file_name().map(|n| n.to_os_string());

        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let touches_target = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == target);
                    if touches_target {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::warn!(error = %e, "directory watch error"),
            }
        })
        .and_then(|mut w| w.watch(&self.root, RecursiveMode::NonRecursive).map(|_| w));

        let watcher = match watcher {
            Ok(w) => w,
            Err(e) => return stream::once(async move { Err(StoreError::Watch(e)) }).boxed(),
        };

        let state = WatchState { path, rx, _watcher: watcher, last: None };
        stream::unfold(state, |mut st| async move {
            loop {
                if st.last.is_some() {
                    st.rx.recv().await?;
                    // Coalesce bursts (temp write + rename) into one re-read.
                    while st.rx.try_recv().is_ok() {}
                }
                match read_collection(&st.path).await {
                    Ok(items) if st.last.as_ref() == Some(&items) => continue,
                    Ok(items) => {
                        st.last = Some(items.clone());
                        return Some((Ok(items), st));
                    }
                    Err(e) => {
                        // Mark as delivered so the next event triggers a re-read.
                        st.last.get_or_insert_with(Vec::new);
                        return Some((Err(e), st));
                    }
                }
            }
        })
        .boxed()
    }
}

struct WatchState {
    path: PathBuf,
    rx: mpsc::UnboundedReceiver<()>,
    _watcher: RecommendedWatcher,
    last: Option<Vec<ItemReport>>,
}

impl ReportStore for DirStore {
    fn create_report(
        &self,
        report: NewReport,
        owner: Option<Identity>,
    ) -> BoxFuture<'_, StoreResult<ItemId>> {
        async move {
            let now = Utc::now();
            let mut report = report;
            let image = report.image.take();
            let image_url = upload_image(&self.blobs, owner.as_ref(), image, now).await?;

            let result = self.insert_report(report, owner.as_ref(), image_url.clone(), now).await;
            if let (Err(e), Some(url)) = (&result, image_url) {
                tracing::warn!(error = %e, url = %url, "report not stored, removing its image");
                if let Err(cleanup) = self.blobs.delete(url).await {
                    tracing::warn!(error = %cleanup, "image cleanup failed");
                }
            }
            result
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
            let removed = {
                let _guard = self.lock_for_write().await?;
                let path = self.path(kind);
                let mut items = read_collection(&path).await?;
                let pos = items.iter().position(|r| r.id == id).ok_or_else(|| {
                    StoreError::NotFound { collection: kind.collection(), id: id.clone() }
                })?;
                if !items[pos].is_owned_by(&requester) {
                    return Err(StoreError::NotOwner(id));
                }
                let removed = items.remove(pos);
                write_collection(&path, &items).await?;
                removed
            };
            tracing::info!(collection = kind.collection(), %id, "report deleted");
            delete_image_best_effort(&self.blobs, &removed).await;
            Ok(())
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Blobs
// ---------------------------------------------------------------------------

/// Photos stored as plain files; URLs are `file://<absolute path>`.
pub struct DirBlobs {
    root: PathBuf,
}

impl DirBlobs {
    /// Resolve a URL to a path inside this store, rejecting anything else.
    pub fn resolve(&self, url: &str) -> StoreResult<PathBuf> {
        let path = url
            .strip_prefix(URL_SCHEME)
            .map(PathBuf::from)
            .ok_or_else(|| StoreError::ForeignBlob(url.to_string()))?;
        let inside = path.starts_with(&self.root)
            && !path.components().any(|c| matches!(c, std::path::Component::ParentDir));
        if inside {
            Ok(path)
        } else {
            Err(StoreError::ForeignBlob(url.to_string()))
        }
    }
}

impl BlobStore for DirBlobs {
    fn put(
        &self,
        key: String,
        data: Bytes,
        _content_type: String,
    ) -> BoxFuture<'_, StoreResult<String>> {
        async move {
            let path = self.root.join(&key);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &data).await?;
            Ok(format!("{URL_SCHEME}{}", path.display()))
        }
        .boxed()
    }

    fn delete(&self, url: String) -> BoxFuture<'_, StoreResult<()>> {
        async move {
            let path = self.resolve(&url)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(StoreError::BlobNotFound(url))
                }
                Err(e) => Err(e.into()),
            }
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{Category, ImageUpload};
    use chrono::NaiveDate;

    fn new_report(kind: ItemType, image: Option<ImageUpload>) -> NewReport {
        NewReport {
            kind,
            item_name: "Keys".into(),
            description: "Three keys on a climbing carabiner".into(),
            category: Category::Other,
            location: "Quad".into(),
            date: NaiveDate::from_ymd_opt(2026, 4, 4).unwrap(),
            image,
        }
    }

    #[tokio::test]
    async fn open_creates_empty_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        for kind in ItemType::ALL {
            assert!(read_collection(&store.path(kind)).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn create_and_delete_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        let me = Identity::new("u9");
        let image = ImageUpload::new("keys.jpg", vec![0xffu8, 0xd8]);

        let id = store
            .create_report(new_report(ItemType::Found, Some(image)), Some(me.clone()))
            .await
            .unwrap();

        let found = read_collection(&store.path(ItemType::Found)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        let url = found[0].image_url.clone().unwrap();
        let blob = store.blobs().resolve(&url).unwrap();
        assert_eq!(std::fs::read(&blob).unwrap(), vec![0xffu8, 0xd8]);

        store.delete_report(ItemType::Found, id, me).await.unwrap();
        assert!(read_collection(&store.path(ItemType::Found)).await.unwrap().is_empty());
        assert!(!blob.exists());
    }

    #[tokio::test]
    async fn foreign_blob_urls_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.blobs().resolve("file:///etc/passwd"),
            Err(StoreError::ForeignBlob(_))
        ));
        let sneaky = format!("file://{}/../../etc/passwd", store.blobs().root.display());
        assert!(store.blobs().resolve(&sneaky).is_err());
        assert!(store.blobs().resolve("https://example.com/x.png").is_err());
    }

    #[tokio::test]
    async fn malformed_collection_surfaces_as_stream_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        std::fs::write(store.path(ItemType::Lost), "{ not json").unwrap();
        let mut sub = store.subscribe(ItemType::Lost);
        let first = sub.next().await.unwrap();
        assert!(matches!(first, Err(StoreError::Malformed { .. })));
    }

    #[tokio::test]
    async fn subscription_recovers_once_the_file_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        let id = store
            .create_report(new_report(ItemType::Lost, None), None)
            .await
            .unwrap();
        let path = store.path(ItemType::Lost);
        let good = std::fs::read(&path).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let mut sub = store.subscribe(ItemType::Lost);
        assert!(matches!(sub.next().await.unwrap(), Err(StoreError::Malformed { .. })));

        let fixed = dir.path().join("fixed.tmp");
        std::fs::write(&fixed, &good).unwrap();
        std::fs::rename(&fixed, &path).unwrap();
        let next = tokio::time::timeout(std::time::Duration::from_secs(5), sub.next())
            .await
            .expect("no snapshot after the file was fixed")
            .unwrap()
            .unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, id);
    }

    fn files_under(dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                out.extend(files_under(&path));
            } else {
                out.push(path);
            }
        }
        out
    }

    #[tokio::test]
    async fn failed_create_leaves_no_orphaned_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        std::fs::write(store.path(ItemType::Lost), "{ not json").unwrap();
        let image = ImageUpload::new("keys.jpg", vec![0xffu8, 0xd8]);

        let err = store
            .create_report(new_report(ItemType::Lost, Some(image)), Some(Identity::new("u9")))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Malformed { .. }), "{err}");
        assert!(files_under(&store.root().join(BLOB_DIR)).is_empty());
    }

    #[tokio::test]
    async fn writes_leave_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        for kind in [ItemType::Lost, ItemType::Found, ItemType::Lost] {
            store.create_report(new_report(kind, None), None).await.unwrap();
        }
        let leftovers: Vec<_> = files_under(store.root())
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }
}
